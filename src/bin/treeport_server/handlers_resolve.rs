//! Path resolution over the in-memory hierarchy.
//!
//! Segments address a group by id, a project by label, a session by `<id:...>` or label, an
//! acquisition by label, and a file by name.

use super::*;

pub(crate) async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResult>, Response> {
    let hierarchy = state.hierarchy.read().await;
    hierarchy.resolve(&req.path).map(Json).ok_or_else(not_found)
}

fn file_nodes(files: &[StoredFile]) -> Vec<RemoteNode> {
    files
        .iter()
        .map(|f| RemoteNode::File {
            name: f.name.clone(),
        })
        .collect()
}

impl Hierarchy {
    /// `None` when any segment does not exist.
    pub(crate) fn resolve(&self, path: &[String]) -> Option<ResolveResult> {
        let mut out = ResolveResult::default();
        let mut segments = path.iter();

        let Some(group_id) = segments.next() else {
            out.children = self.groups.iter().map(group_node).collect();
            return Some(out);
        };
        let group = self.groups.iter().find(|g| g.id == *group_id)?;
        out.path.push(group_node(group));

        let Some(project_label) = segments.next() else {
            out.children = self
                .projects
                .iter()
                .filter(|p| p.group == group.id)
                .map(project_node)
                .collect();
            return Some(out);
        };
        let project = self
            .projects
            .iter()
            .find(|p| p.group == group.id && p.label == *project_label)?;
        out.path.push(project_node(project));

        let Some(session_seg) = segments.next() else {
            out.children = self
                .sessions
                .iter()
                .filter(|s| s.project == project.id)
                .map(session_node)
                .chain(file_nodes(&project.files))
                .collect();
            return Some(out);
        };
        let by_id = session_seg
            .strip_prefix("<id:")
            .and_then(|s| s.strip_suffix('>'));
        let session = self.sessions.iter().find(|s| {
            s.project == project.id
                && match by_id {
                    Some(id) => s.id == id,
                    None => s.label == *session_seg,
                }
        })?;
        out.path.push(session_node(session));

        let Some(acq_label) = segments.next() else {
            out.children = self
                .acquisitions
                .iter()
                .filter(|a| a.session == session.id)
                .map(acquisition_node)
                .chain(file_nodes(&session.files))
                .collect();
            return Some(out);
        };
        let acq = self
            .acquisitions
            .iter()
            .find(|a| a.session == session.id && a.label == *acq_label)?;
        out.path.push(acquisition_node(acq));

        let Some(file_name) = segments.next() else {
            out.children = file_nodes(&acq.files);
            return Some(out);
        };
        let file = acq.files.iter().find(|f| f.name == *file_name)?;
        out.path.push(RemoteNode::File {
            name: file.name.clone(),
        });

        if segments.next().is_some() {
            return None;
        }
        Some(out)
    }
}

fn group_node(g: &GroupRec) -> RemoteNode {
    RemoteNode::Group {
        id: RemoteId::new(g.id.clone()),
        label: Some(g.label.clone()),
    }
}

fn project_node(p: &ProjectRec) -> RemoteNode {
    RemoteNode::Project {
        id: RemoteId::new(p.id.clone()),
        label: p.label.clone(),
    }
}

fn session_node(s: &SessionRec) -> RemoteNode {
    RemoteNode::Session {
        id: RemoteId::new(s.id.clone()),
        label: s.label.clone(),
        subject: Some(SubjectRef {
            code: s.subject_code.clone(),
        }),
    }
}

fn acquisition_node(a: &AcquisitionRec) -> RemoteNode {
    RemoteNode::Acquisition {
        id: RemoteId::new(a.id.clone()),
        label: a.label.clone(),
    }
}
