//! In-memory tree built from a scanned folder: group/project/subject/session/acquisition.

use std::path::PathBuf;

use super::RemoteId;

/// Whether a container already exists remotely.
///
/// Discovery leaves every container `Unknown`; matching settles it to `Exists` or `Create`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Presence {
    #[default]
    Unknown,
    Exists(RemoteId),
    Create,
}

impl Presence {
    pub fn exists(&self) -> bool {
        matches!(self, Presence::Exists(_))
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Presence::Unknown)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScanTree {
    pub groups: Vec<GroupNode>,
    pub rejected: Vec<RejectedFile>,
}

#[derive(Clone, Debug)]
pub struct GroupNode {
    /// Directory name; doubles as the remote group id.
    pub name: String,
    pub presence: Presence,
    pub projects: Vec<ProjectNode>,
}

#[derive(Clone, Debug)]
pub struct ProjectNode {
    pub label: String,
    pub presence: Presence,
    pub attachments: Vec<Attachment>,
    pub subjects: Vec<SubjectNode>,
}

/// Subjects are not addressable remotely; they only carry a code down to their sessions.
#[derive(Clone, Debug)]
pub struct SubjectNode {
    pub code: String,
    pub sessions: Vec<SessionNode>,
}

#[derive(Clone, Debug)]
pub struct SessionNode {
    pub label: String,
    pub subject_code: String,
    pub presence: Presence,
    pub attachments: Vec<Attachment>,
    pub acquisitions: Vec<AcquisitionNode>,
}

#[derive(Clone, Debug)]
pub struct AcquisitionNode {
    pub label: String,
    pub presence: Presence,
    pub attachments: Vec<Attachment>,
    pub packfiles: Vec<Packfile>,
}

/// A single file uploaded on its own to the container that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A directory under an acquisition, uploaded as one unit tagged with `kind`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packfile {
    pub kind: String,
    pub path: PathBuf,
}

/// Where a file was found that has no attachment point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectedLevel {
    Root,
    Group,
    Subject,
}

impl RejectedLevel {
    pub fn as_plural(&self) -> &'static str {
        match self {
            RejectedLevel::Root => "root",
            RejectedLevel::Group => "groups",
            RejectedLevel::Subject => "subjects",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub level: RejectedLevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub groups: u64,
    pub projects: u64,
    pub subjects: u64,
    pub sessions: u64,
    pub acquisitions: u64,
    pub attachments: u64,
    pub packfiles: u64,
}

impl ScanTree {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Containers that will be created on inflate. Only meaningful after matching.
    pub fn pending_creates(&self) -> u64 {
        self.presences()
            .into_iter()
            .filter(|p| **p == Presence::Create)
            .count() as u64
    }

    /// True once matching has decided every container.
    pub fn is_settled(&self) -> bool {
        self.presences().into_iter().all(Presence::is_settled)
    }

    fn presences(&self) -> Vec<&Presence> {
        let mut out = Vec::new();
        for g in &self.groups {
            out.push(&g.presence);
            for p in &g.projects {
                out.push(&p.presence);
                for s in p.subjects.iter().flat_map(|s| &s.sessions) {
                    out.push(&s.presence);
                    out.extend(s.acquisitions.iter().map(|a| &a.presence));
                }
            }
        }
        out
    }
}
