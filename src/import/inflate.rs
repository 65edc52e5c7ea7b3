//! Turns a matched tree into remote state: creates missing containers top-down, then
//! uploads attachments and packfiles into them.

use std::io::Write;

use anyhow::{Context, Result};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tracing::info;

use super::discover::{DiscoverOptions, packfile_files};
use super::prompt::Prompter;
use super::retry::with_retry;
use crate::model::{
    AcquisitionNode, Attachment, GroupNode, Packfile, Presence, ProjectNode, RemoteId,
    ScanTree, SessionNode,
};
use crate::remote::{
    AcquisitionMeta, ContainerRef, IdRef, PackfileKind, PackfileMetadata, ProjectMeta,
    RemoteApi, SessionMeta, SubjectRef, UploadHandle, UploadSource,
};

/// What an inflate run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InflateReport {
    pub groups_created: u64,
    pub projects_created: u64,
    pub sessions_created: u64,
    pub acquisitions_created: u64,
    pub attachments_uploaded: u64,
    pub packfiles_uploaded: u64,
}

impl InflateReport {
    pub fn containers_created(&self) -> u64 {
        self.groups_created
            + self.projects_created
            + self.sessions_created
            + self.acquisitions_created
    }
}

pub struct Inflater<'a, R: RemoteApi> {
    remote: &'a R,
    prompter: &'a mut dyn Prompter,
    out: &'a mut dyn Write,
    show_progress: bool,
    discover: DiscoverOptions,
    report: InflateReport,
}

impl<'a, R: RemoteApi> Inflater<'a, R> {
    pub fn new(remote: &'a R, prompter: &'a mut dyn Prompter, out: &'a mut dyn Write) -> Self {
        Self {
            remote,
            prompter,
            out,
            show_progress: false,
            discover: DiscoverOptions::default(),
            report: InflateReport::default(),
        }
    }

    /// Draw a byte progress bar on stderr while uploads stream.
    pub fn show_progress(mut self, on: bool) -> Self {
        self.show_progress = on;
        self
    }

    /// Filters applied when listing the files of each packfile directory.
    pub fn discover_options(mut self, opts: DiscoverOptions) -> Self {
        self.discover = opts;
        self
    }

    /// Consumes the tree depth-first; every container id exists before its children are touched.
    pub fn run(mut self, tree: ScanTree) -> Result<InflateReport> {
        if !tree.is_settled() {
            anyhow::bail!("tree was never matched against the remote");
        }
        for group in tree.groups {
            self.group(group)?;
        }
        Ok(self.report)
    }

    fn group(&mut self, group: GroupNode) -> Result<()> {
        let name = group.name;
        let created = group.presence == Presence::Create;
        let group_id = self.settle(group.presence, "group", &name, |r| r.create_group(&name))?;
        if created {
            self.report.groups_created += 1;
        }

        for project in group.projects {
            self.project(&group_id, project)?;
        }
        Ok(())
    }

    fn project(&mut self, group_id: &RemoteId, project: ProjectNode) -> Result<()> {
        let label = project.label;
        let created = project.presence == Presence::Create;
        let project_id = self.settle(project.presence, "project", &label, |r| {
            r.create_project(group_id, &label)
        })?;
        if created {
            self.report.projects_created += 1;
        }

        self.attachments(&ContainerRef::Project(project_id.clone()), project.attachments)?;

        let scope = ProjectScope {
            group_id: group_id.clone(),
            project_id,
            project_label: label,
        };
        for subject in project.subjects {
            for session in subject.sessions {
                self.session(&scope, session)?;
            }
        }
        Ok(())
    }

    fn session(&mut self, scope: &ProjectScope, session: SessionNode) -> Result<()> {
        let label = session.label;
        let code = session.subject_code;
        let created = session.presence == Presence::Create;
        let session_id = self.settle(session.presence, "session", &label, |r| {
            r.create_session(&scope.project_id, &label, &code)
        })?;
        if created {
            self.report.sessions_created += 1;
        }

        self.attachments(&ContainerRef::Session(session_id.clone()), session.attachments)?;

        for acq in session.acquisitions {
            self.acquisition(scope, &label, &code, &session_id, acq)?;
        }
        Ok(())
    }

    fn acquisition(
        &mut self,
        scope: &ProjectScope,
        session_label: &str,
        subject_code: &str,
        session_id: &RemoteId,
        acq: AcquisitionNode,
    ) -> Result<()> {
        let label = acq.label;
        let created = acq.presence == Presence::Create;
        let acq_id = self.settle(acq.presence, "acquisition", &label, |r| {
            r.create_acquisition(session_id, &label)
        })?;
        if created {
            self.report.acquisitions_created += 1;
        }

        self.attachments(&ContainerRef::Acquisition(acq_id), acq.attachments)?;

        let ctx = PackfileContext {
            group_id: scope.group_id.clone(),
            project_id: scope.project_id.clone(),
            project_label: scope.project_label.clone(),
            session_label: session_label.to_string(),
            subject_code: subject_code.to_string(),
            acquisition_label: label,
        };
        for packfile in acq.packfiles {
            self.packfile(&ctx, packfile)?;
        }
        Ok(())
    }

    /// Returns the container's id, creating it first when matching found it missing.
    fn settle(
        &mut self,
        presence: Presence,
        kind: &str,
        name: &str,
        mut create: impl FnMut(&R) -> Result<RemoteId>,
    ) -> Result<RemoteId> {
        match presence {
            Presence::Exists(id) => Ok(id),
            Presence::Create => {
                writeln!(self.out, "Creating {} {}", kind, name)?;
                let remote = self.remote;
                let id = with_retry(
                    &mut *self.prompter,
                    &mut *self.out,
                    &format!("create {} {}", kind, name),
                    |_| create(remote),
                )?;
                info!(kind, name, %id, "created");
                Ok(id)
            }
            Presence::Unknown => {
                anyhow::bail!("{} {} was never matched against the remote", kind, name)
            }
        }
    }

    fn attachments(&mut self, dest: &ContainerRef, attachments: Vec<Attachment>) -> Result<()> {
        for attachment in attachments {
            writeln!(self.out, "Upload file {}", attachment.name)?;
            let remote = self.remote;
            let show_progress = self.show_progress;
            with_retry(
                &mut *self.prompter,
                &mut *self.out,
                &format!("upload {}", attachment.name),
                |out| {
                    let source = UploadSource::new(&attachment.name, &attachment.path);
                    let handle = remote.upload_files(dest, None, vec![source])?;
                    drain_upload(handle, out, show_progress)
                },
            )?;
            info!(file = %attachment.name, container = %dest.id(), "uploaded");
            self.report.attachments_uploaded += 1;
        }
        Ok(())
    }

    fn packfile(&mut self, ctx: &PackfileContext, packfile: Packfile) -> Result<()> {
        writeln!(self.out, "Upload packfile {}", packfile.kind)?;
        let remote = self.remote;
        let show_progress = self.show_progress;
        let opts = &self.discover;
        with_retry(
            &mut *self.prompter,
            &mut *self.out,
            &format!("upload packfile {}", packfile.kind),
            |out| upload_packfile(remote, ctx, &packfile, opts, out, show_progress),
        )?;
        info!(kind = %packfile.kind, acquisition = %ctx.acquisition_label, "packfile uploaded");
        self.report.packfiles_uploaded += 1;
        Ok(())
    }
}

struct ProjectScope {
    group_id: RemoteId,
    project_id: RemoteId,
    project_label: String,
}

/// Everything the packfile metadata needs except its type, which is added only after the
/// stream step has succeeded.
#[derive(Clone, Debug)]
pub(crate) struct PackfileContext {
    pub(crate) group_id: RemoteId,
    pub(crate) project_id: RemoteId,
    pub(crate) project_label: String,
    pub(crate) session_label: String,
    pub(crate) subject_code: String,
    pub(crate) acquisition_label: String,
}

impl PackfileContext {
    pub(crate) fn finalize(&self, kind: &str) -> PackfileMetadata {
        PackfileMetadata {
            group: IdRef {
                id: self.group_id.clone(),
            },
            project: ProjectMeta {
                id: self.project_id.clone(),
                label: self.project_label.clone(),
            },
            session: SessionMeta {
                label: self.session_label.clone(),
                subject: SubjectRef {
                    code: self.subject_code.clone(),
                },
            },
            acquisition: AcquisitionMeta {
                label: self.acquisition_label.clone(),
            },
            packfile: PackfileKind {
                kind: kind.to_string(),
            },
        }
    }
}

/// start -> stream -> finish, always from the top.
fn upload_packfile(
    remote: &impl RemoteApi,
    ctx: &PackfileContext,
    packfile: &Packfile,
    opts: &DiscoverOptions,
    out: &mut dyn Write,
    show_progress: bool,
) -> Result<()> {
    let token = remote.packfile_start(&ctx.project_id)?;

    let sources: Vec<UploadSource> = packfile_files(&packfile.path, opts)
        .with_context(|| format!("scan packfile {}", packfile.path.display()))?
        .into_iter()
        .map(|f| UploadSource::new(f.name, f.path))
        .collect();
    writeln!(
        out,
        "  Streaming {} files from {}",
        sources.len(),
        packfile.path.display()
    )?;

    let handle = remote.packfile_stream(&ctx.project_id, &token, sources)?;
    drain_upload(handle, out, show_progress)?;

    let metadata = ctx.finalize(&packfile.kind);
    remote.packfile_finish(&ctx.project_id, &token, &metadata)?;
    Ok(())
}

/// Surfaces progress until the body is streamed, then waits for the remote's verdict.
fn drain_upload(handle: UploadHandle, out: &mut dyn Write, show_progress: bool) -> Result<()> {
    let bar = if show_progress {
        let bar = ProgressBar::new(handle.total_bytes());
        if let Ok(style) =
            ProgressStyle::with_template("  {bytes}/{total_bytes} [{wide_bar}] {bytes_per_sec}")
        {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut sent = 0;
    for bytes in handle.progress() {
        sent = bytes;
        bar.set_position(bytes);
    }
    let result = handle.wait();
    bar.finish_and_clear();
    result?;

    writeln!(out, "  Uploaded {}", HumanBytes(sent))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/import/inflate_tests.rs"]
mod tests;
