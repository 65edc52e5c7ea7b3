use super::*;

fn created(id: &str) -> Json<CreatedResponse> {
    Json(CreatedResponse {
        id: RemoteId::new(id),
    })
}

fn require_label(label: &str) -> Result<(), Response> {
    if label.trim().is_empty() {
        return Err(bad_request(anyhow::anyhow!("label must not be empty")));
    }
    Ok(())
}

pub(crate) async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<Json<CreatedResponse>, Response> {
    require_label(&payload.id)?;
    let mut h = state.hierarchy.write().await;
    if h.groups.iter().any(|g| g.id == payload.id) {
        return Err(conflict("group already exists"));
    }
    h.groups.push(GroupRec {
        id: payload.id.clone(),
        label: payload.label.clone(),
    });
    h.record("create_group", Some(format!("groups/{}", payload.id)), Some(payload.label));
    Ok(created(&payload.id))
}

pub(crate) async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<CreatedResponse>, Response> {
    require_label(&payload.label)?;
    let id = new_id().map_err(internal_error)?;
    let mut h = state.hierarchy.write().await;
    if !h.groups.iter().any(|g| g.id == payload.group.as_str()) {
        return Err(not_found());
    }
    h.projects.push(ProjectRec {
        id: id.clone(),
        group: payload.group.as_str().to_string(),
        label: payload.label.clone(),
        files: Vec::new(),
    });
    h.record("create_project", Some(format!("projects/{}", id)), Some(payload.label));
    Ok(created(&id))
}

pub(crate) async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<CreatedResponse>, Response> {
    require_label(&payload.label)?;
    let id = new_id().map_err(internal_error)?;
    let mut h = state.hierarchy.write().await;
    if !h.projects.iter().any(|p| p.id == payload.project.as_str()) {
        return Err(not_found());
    }
    h.sessions.push(SessionRec {
        id: id.clone(),
        project: payload.project.as_str().to_string(),
        label: payload.label.clone(),
        subject_code: payload.subject.code.clone(),
        files: Vec::new(),
    });
    let event = h.record("create_session", Some(format!("sessions/{}", id)), Some(payload.label));
    event.metadata = Some(serde_json::json!({"subject": {"code": payload.subject.code}}));
    Ok(created(&id))
}

pub(crate) async fn create_acquisition(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAcquisitionRequest>,
) -> Result<Json<CreatedResponse>, Response> {
    require_label(&payload.label)?;
    let id = new_id().map_err(internal_error)?;
    let mut h = state.hierarchy.write().await;
    if !h.sessions.iter().any(|s| s.id == payload.session.as_str()) {
        return Err(not_found());
    }
    h.acquisitions.push(AcquisitionRec {
        id: id.clone(),
        session: payload.session.as_str().to_string(),
        label: payload.label.clone(),
        files: Vec::new(),
    });
    h.record(
        "create_acquisition",
        Some(format!("acquisitions/{}", id)),
        Some(payload.label),
    );
    Ok(created(&id))
}
