//! Plain file uploads and the three-step packfile protocol.

use super::*;

#[derive(Default)]
struct Parts {
    metadata: Option<serde_json::Value>,
    files: Vec<StoredFile>,
}

/// Reads a `metadata` JSON part (optional) and any number of `file` parts.
async fn read_parts(mut multipart: Multipart) -> Result<Parts, Response> {
    let mut parts = Parts::default();
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(anyhow::anyhow!("read multipart body: {}", e)))?;
        let Some(field) = field else {
            break;
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(anyhow::anyhow!("read part {:?}: {}", name, e)))?;
        match (name.as_str(), file_name) {
            ("metadata", None) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| bad_request(anyhow::anyhow!("parse metadata part: {}", e)))?;
                parts.metadata = Some(value);
            }
            ("file", Some(file_name)) => parts.files.push(StoredFile::digest(file_name, &bytes)),
            _ => {
                return Err(bad_request(anyhow::anyhow!(
                    "unexpected multipart field {:?}",
                    name
                )));
            }
        }
    }
    Ok(parts)
}

async fn upload_into(
    state: &AppState,
    coll: Collection,
    id: &str,
    multipart: Multipart,
) -> Result<Json<Vec<StoredFile>>, Response> {
    let parts = read_parts(multipart).await?;
    if parts.files.is_empty() {
        return Err(bad_request(anyhow::anyhow!("no file parts in upload")));
    }

    let mut h = state.hierarchy.write().await;
    let Some(files) = h.files_mut(coll, id) else {
        return Err(not_found());
    };
    for file in &parts.files {
        files.retain(|f| f.name != file.name);
        files.push(file.clone());
    }
    let event = h.record(
        "upload",
        Some(format!("{}/{}", coll.as_str(), id)),
        None,
    );
    event.files = parts.files.clone();
    event.metadata = parts.metadata;
    Ok(Json(parts.files))
}

pub(crate) async fn upload_project_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Vec<StoredFile>>, Response> {
    upload_into(&state, Collection::Projects, &id, multipart).await
}

pub(crate) async fn upload_session_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Vec<StoredFile>>, Response> {
    upload_into(&state, Collection::Sessions, &id, multipart).await
}

pub(crate) async fn upload_acquisition_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Vec<StoredFile>>, Response> {
    upload_into(&state, Collection::Acquisitions, &id, multipart).await
}

pub(crate) async fn packfile_start(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<PackfileStartResponse>, Response> {
    let token = new_id().map_err(internal_error)?;
    let mut h = state.hierarchy.write().await;
    if !h.projects.iter().any(|p| p.id == project_id) {
        return Err(not_found());
    }
    h.packfiles.insert(
        token.clone(),
        PendingPackfile {
            project: project_id.clone(),
            files: Vec::new(),
        },
    );
    h.record("packfile_start", Some(format!("projects/{}", project_id)), None);
    Ok(Json(PackfileStartResponse { token: Some(token) }))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct TokenQuery {
    token: String,
}

pub(crate) async fn packfile_stream(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Query(query): Query<TokenQuery>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, Response> {
    let parts = read_parts(multipart).await?;

    let mut h = state.hierarchy.write().await;
    let Some(pending) = h.packfiles.get_mut(&query.token) else {
        return Err(bad_request(anyhow::anyhow!("unknown packfile token")));
    };
    if pending.project != project_id {
        return Err(bad_request(anyhow::anyhow!(
            "packfile token belongs to another project"
        )));
    }
    pending.files.extend(parts.files.iter().cloned());
    let received = pending.files.len();
    let event = h.record("packfile_stream", Some(format!("projects/{}", project_id)), None);
    event.files = parts.files;
    Ok(Json(serde_json::json!({"received": received})))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PackfileEndQuery {
    token: String,
    metadata: String,
}

/// Assembles the streamed files into one packfile on the acquisition named by the metadata,
/// creating the session or acquisition when missing. Success is a short event stream.
pub(crate) async fn packfile_end(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Query(query): Query<PackfileEndQuery>,
) -> Response {
    let metadata: PackfileMetadata = match serde_json::from_str(&query.metadata) {
        Ok(m) => m,
        Err(err) => {
            return text_error(
                StatusCode::BAD_REQUEST,
                format!("invalid packfile metadata: {}", err),
            );
        }
    };

    let mut h = state.hierarchy.write().await;
    let Some(pending) = h.packfiles.get(&query.token) else {
        return text_error(StatusCode::BAD_REQUEST, "unknown packfile token");
    };
    if pending.project != project_id || metadata.project.id.as_str() != project_id {
        return text_error(
            StatusCode::BAD_REQUEST,
            "packfile metadata does not match the token's project",
        );
    }
    let Some(project) = h.projects.iter().find(|p| p.id == project_id) else {
        return text_error(StatusCode::NOT_FOUND, "project not found");
    };
    if project.group != metadata.group.id.as_str() {
        return text_error(
            StatusCode::BAD_REQUEST,
            "packfile metadata names a different group",
        );
    }
    let Some(pending) = h.packfiles.remove(&query.token) else {
        return text_error(StatusCode::BAD_REQUEST, "unknown packfile token");
    };

    let session_id = match h.sessions.iter().find(|s| {
        s.project == project_id
            && s.label == metadata.session.label
            && s.subject_code == metadata.session.subject.code
    }) {
        Some(s) => s.id.clone(),
        None => {
            let id = match new_id() {
                Ok(id) => id,
                Err(err) => return internal_error(err),
            };
            h.sessions.push(SessionRec {
                id: id.clone(),
                project: project_id.clone(),
                label: metadata.session.label.clone(),
                subject_code: metadata.session.subject.code.clone(),
                files: Vec::new(),
            });
            id
        }
    };
    let acq_index = match h
        .acquisitions
        .iter()
        .position(|a| a.session == session_id && a.label == metadata.acquisition.label)
    {
        Some(i) => i,
        None => {
            let id = match new_id() {
                Ok(id) => id,
                Err(err) => return internal_error(err),
            };
            h.acquisitions.push(AcquisitionRec {
                id,
                session: session_id.clone(),
                label: metadata.acquisition.label.clone(),
                files: Vec::new(),
            });
            h.acquisitions.len() - 1
        }
    };

    let mut hasher = blake3::Hasher::new();
    for f in &pending.files {
        hasher.update(f.name.as_bytes());
        hasher.update(f.blake3.as_bytes());
    }
    let archive = StoredFile {
        name: format!("{}.zip", metadata.packfile.kind),
        size: pending.files.iter().map(|f| f.size).sum(),
        blake3: hasher.finalize().to_hex().to_string(),
    };
    let acq = &mut h.acquisitions[acq_index];
    acq.files.retain(|f| f.name != archive.name);
    acq.files.push(archive);
    let acq_id = acq.id.clone();

    let total = pending.files.len();
    let event = h.record(
        "packfile_end",
        Some(format!("acquisitions/{}", acq_id)),
        Some(metadata.packfile.kind.clone()),
    );
    event.files = pending.files;
    event.metadata = serde_json::to_value(&metadata).ok();

    let mut body = String::new();
    for done in 1..=total {
        body.push_str(&format!(
            "event: progress\ndata: {{\"done\": {}, \"total\": {}}}\n\n",
            done, total
        ));
    }
    body.push_str(&format!(
        "event: result\ndata: {{\"acquisition\": \"{}\"}}\n\n",
        acq_id
    ));
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
