//! DTOs and payload types for remote API requests/responses.

use crate::model::RemoteId;

/// A typed entity returned by the resolver, decoded on its `node_type` tag.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum RemoteNode {
    Group {
        #[serde(rename = "_id")]
        id: RemoteId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Project {
        #[serde(rename = "_id")]
        id: RemoteId,
        label: String,
    },
    Subject {
        #[serde(rename = "_id")]
        id: RemoteId,
        code: String,
    },
    Session {
        #[serde(rename = "_id")]
        id: RemoteId,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<SubjectRef>,
    },
    Acquisition {
        #[serde(rename = "_id")]
        id: RemoteId,
        label: String,
    },
    File {
        name: String,
    },
    /// A node type this client does not know about.
    #[serde(other)]
    Unknown,
}

impl RemoteNode {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteNode::Group { .. } => "group",
            RemoteNode::Project { .. } => "project",
            RemoteNode::Subject { .. } => "subject",
            RemoteNode::Session { .. } => "session",
            RemoteNode::Acquisition { .. } => "acquisition",
            RemoteNode::File { .. } => "file",
            RemoteNode::Unknown => "unknown",
        }
    }

    pub fn id(&self) -> Option<&RemoteId> {
        match self {
            RemoteNode::Group { id, .. }
            | RemoteNode::Project { id, .. }
            | RemoteNode::Subject { id, .. }
            | RemoteNode::Session { id, .. }
            | RemoteNode::Acquisition { id, .. } => Some(id),
            RemoteNode::File { .. } | RemoteNode::Unknown => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RemoteNode::Group { id, label } => Some(label.as_deref().unwrap_or(id.as_str())),
            RemoteNode::Project { label, .. }
            | RemoteNode::Session { label, .. }
            | RemoteNode::Acquisition { label, .. } => Some(label),
            RemoteNode::Subject { code, .. } => Some(code),
            RemoteNode::File { name } => Some(name),
            RemoteNode::Unknown => None,
        }
    }

    pub fn subject_code(&self) -> Option<&str> {
        match self {
            RemoteNode::Session {
                subject: Some(s), ..
            } => Some(&s.code),
            RemoteNode::Subject { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubjectRef {
    pub code: String,
}

/// Resolved ancestor chain plus the entities directly beneath its last element.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResolveResult {
    #[serde(default)]
    pub path: Vec<RemoteNode>,
    #[serde(default)]
    pub children: Vec<RemoteNode>,
}

impl ResolveResult {
    /// The node addressed by the full request path, if every segment resolved.
    pub fn terminal(&self, requested_len: usize) -> Option<&RemoteNode> {
        if requested_len == 0 || self.path.len() != requested_len {
            return None;
        }
        self.path.last()
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ResolveRequest {
    pub path: Vec<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateGroupRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateProjectRequest {
    pub group: RemoteId,
    pub label: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateSessionRequest {
    pub project: RemoteId,
    pub label: String,
    pub subject: SubjectRef,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateAcquisitionRequest {
    pub session: RemoteId,
    pub label: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreatedResponse {
    #[serde(rename = "_id")]
    pub id: RemoteId,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PackfileStartResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// One-time token scoping a packfile upload to a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackfileToken(pub String);

impl PackfileToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdRef {
    #[serde(rename = "_id")]
    pub id: RemoteId,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectMeta {
    #[serde(rename = "_id")]
    pub id: RemoteId,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionMeta {
    pub label: String,
    pub subject: SubjectRef,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AcquisitionMeta {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackfileKind {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Document submitted with `packfile-end`, telling the remote where the packfile belongs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackfileMetadata {
    pub group: IdRef,
    pub project: ProjectMeta,
    pub session: SessionMeta,
    pub acquisition: AcquisitionMeta,
    pub packfile: PackfileKind,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RemoteUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

impl RemoteUser {
    pub fn display_name(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.id.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/remote/types_tests.rs"]
mod tests;
