use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::model::{RemoteId, UserConfig};

mod http_client;
use self::http_client::check_response;

mod types;
pub use self::types::*;
mod containers;
mod identity;
mod packfile;
mod resolver;
mod upload;
pub use self::upload::UploadHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the remote hierarchy API.
#[derive(Clone)]
pub struct RemoteClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl RemoteClient {
    pub fn new(cfg: &UserConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("treeport")
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A local file sent as one named part of a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSource {
    pub name: String,
    pub path: PathBuf,
}

impl UploadSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Container that accepts plain file uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerRef {
    Project(RemoteId),
    Session(RemoteId),
    Acquisition(RemoteId),
}

impl ContainerRef {
    pub fn id(&self) -> &RemoteId {
        match self {
            ContainerRef::Project(id) | ContainerRef::Session(id) | ContainerRef::Acquisition(id) => {
                id
            }
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            ContainerRef::Project(_) => "projects",
            ContainerRef::Session(_) => "sessions",
            ContainerRef::Acquisition(_) => "acquisitions",
        }
    }

    pub(crate) fn files_path(&self) -> String {
        format!("/api/{}/{}/files", self.collection(), self.id())
    }
}

/// Every remote call the import engine makes.
///
/// `RemoteClient` is the production implementation; tests substitute a recorder.
pub trait RemoteApi {
    /// An empty first segment resolves the root.
    fn resolve(&self, path: &[String]) -> Result<ResolveResult>;

    fn create_group(&self, id: &str) -> Result<RemoteId>;
    fn create_project(&self, group: &RemoteId, label: &str) -> Result<RemoteId>;
    fn create_session(
        &self,
        project: &RemoteId,
        label: &str,
        subject_code: &str,
    ) -> Result<RemoteId>;
    fn create_acquisition(&self, session: &RemoteId, label: &str) -> Result<RemoteId>;

    fn upload_files(
        &self,
        dest: &ContainerRef,
        metadata: Option<&serde_json::Value>,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle>;

    fn packfile_start(&self, project: &RemoteId) -> Result<PackfileToken>;
    fn packfile_stream(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle>;
    fn packfile_finish(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        metadata: &PackfileMetadata,
    ) -> Result<()>;
}

impl RemoteApi for RemoteClient {
    fn resolve(&self, path: &[String]) -> Result<ResolveResult> {
        self.resolve_path(path)
    }

    fn create_group(&self, id: &str) -> Result<RemoteId> {
        self.add_group(id)
    }

    fn create_project(&self, group: &RemoteId, label: &str) -> Result<RemoteId> {
        self.add_project(group, label)
    }

    fn create_session(
        &self,
        project: &RemoteId,
        label: &str,
        subject_code: &str,
    ) -> Result<RemoteId> {
        self.add_session(project, label, subject_code)
    }

    fn create_acquisition(&self, session: &RemoteId, label: &str) -> Result<RemoteId> {
        self.add_acquisition(session, label)
    }

    fn upload_files(
        &self,
        dest: &ContainerRef,
        metadata: Option<&serde_json::Value>,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle> {
        self.upload_simple(&dest.files_path(), &[], metadata, sources)
    }

    fn packfile_start(&self, project: &RemoteId) -> Result<PackfileToken> {
        self.start_packfile(project)
    }

    fn packfile_stream(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle> {
        self.stream_packfile(project, token, sources)
    }

    fn packfile_finish(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        metadata: &PackfileMetadata,
    ) -> Result<()> {
        self.finish_packfile(project, token, metadata)
    }
}
