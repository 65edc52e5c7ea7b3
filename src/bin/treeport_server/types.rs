use super::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api_key: String,
    pub(crate) hierarchy: Arc<RwLock<Hierarchy>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Collection {
    Projects,
    Sessions,
    Acquisitions,
}

impl Collection {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Sessions => "sessions",
            Collection::Acquisitions => "acquisitions",
        }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub(crate) struct StoredFile {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) blake3: String,
}

impl StoredFile {
    pub(crate) fn digest(name: String, bytes: &[u8]) -> Self {
        Self {
            name,
            size: bytes.len() as u64,
            blake3: blake3::hash(bytes).to_hex().to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct GroupRec {
    pub(crate) id: String,
    pub(crate) label: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ProjectRec {
    pub(crate) id: String,
    pub(crate) group: String,
    pub(crate) label: String,
    pub(crate) files: Vec<StoredFile>,
}

#[derive(Clone, Debug)]
pub(crate) struct SessionRec {
    pub(crate) id: String,
    pub(crate) project: String,
    pub(crate) label: String,
    pub(crate) subject_code: String,
    pub(crate) files: Vec<StoredFile>,
}

#[derive(Clone, Debug)]
pub(crate) struct AcquisitionRec {
    pub(crate) id: String,
    pub(crate) session: String,
    pub(crate) label: String,
    pub(crate) files: Vec<StoredFile>,
}

/// Files streamed under a packfile token, waiting for `packfile-end`.
#[derive(Clone, Debug)]
pub(crate) struct PendingPackfile {
    pub(crate) project: String,
    pub(crate) files: Vec<StoredFile>,
}

/// One mutation, as exposed on `/debug/events`.
#[derive(Clone, Debug, serde::Serialize)]
pub(crate) struct Event {
    pub(crate) seq: u64,
    pub(crate) at: String,
    pub(crate) kind: String,
    /// `collection/id` of the container the event applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) files: Vec<StoredFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) metadata: Option<serde_json::Value>,
}

#[derive(Default)]
pub(crate) struct Hierarchy {
    pub(crate) groups: Vec<GroupRec>,
    pub(crate) projects: Vec<ProjectRec>,
    pub(crate) sessions: Vec<SessionRec>,
    pub(crate) acquisitions: Vec<AcquisitionRec>,
    pub(crate) packfiles: HashMap<String, PendingPackfile>,
    pub(crate) events: Vec<Event>,
}

impl Hierarchy {
    pub(crate) fn record(
        &mut self,
        kind: &str,
        container: Option<String>,
        label: Option<String>,
    ) -> &mut Event {
        let seq = self.events.len() as u64 + 1;
        info!(seq, kind, container = container.as_deref().unwrap_or("-"), "event");
        self.events.push(Event {
            seq,
            at: now_ts(),
            kind: kind.to_string(),
            container,
            label,
            files: Vec::new(),
            metadata: None,
        });
        let last = self.events.len() - 1;
        &mut self.events[last]
    }

    pub(crate) fn files_mut(&mut self, coll: Collection, id: &str) -> Option<&mut Vec<StoredFile>> {
        match coll {
            Collection::Projects => self
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .map(|p| &mut p.files),
            Collection::Sessions => self
                .sessions
                .iter_mut()
                .find(|s| s.id == id)
                .map(|s| &mut s.files),
            Collection::Acquisitions => self
                .acquisitions
                .iter_mut()
                .find(|a| a.id == id)
                .map(|a| &mut a.files),
        }
    }
}

pub(crate) fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

/// 12 random bytes, hex-encoded.
pub(crate) fn new_id() -> Result<String> {
    let mut bytes = [0u8; 12];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {:?}", e))?;
    let mut out = String::with_capacity(24);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}
