//! Local folder walk: classifies entries into the fixed five-level hierarchy.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::model::{
    AcquisitionNode, Attachment, GroupNode, Packfile, Presence, ProjectNode, RejectedFile,
    RejectedLevel, ScanSummary, ScanTree, SessionNode, SubjectNode,
};

#[derive(Clone, Debug, Default)]
pub struct DiscoverOptions {
    /// Entry names matching any of these are skipped, at every level.
    pub exclude: Option<GlobSet>,
    /// Classify symlinks by their target instead of skipping them.
    pub follow_symlinks: bool,
}

impl DiscoverOptions {
    pub fn new(exclude: &[String], follow_symlinks: bool) -> Result<Self> {
        let exclude = if exclude.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in exclude {
                builder.add(
                    Glob::new(pattern)
                        .with_context(|| format!("invalid exclude pattern {:?}", pattern))?,
                );
            }
            Some(builder.build().context("build exclude patterns")?)
        };
        Ok(Self {
            exclude,
            follow_symlinks,
        })
    }

    fn excludes(&self, name: &str) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(name))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

#[derive(Clone, Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
    size: u64,
}

impl Entry {
    fn into_attachment(self) -> Attachment {
        Attachment {
            name: self.name,
            path: self.path,
            size: self.size,
        }
    }
}

/// Walks `root` and builds the hierarchy tree. Nothing remote is touched.
///
/// Any filesystem error aborts the whole scan.
pub fn discover(root: &Path, opts: &DiscoverOptions) -> Result<(ScanTree, ScanSummary)> {
    let meta = fs::metadata(root).with_context(|| format!("stat {}", root.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut walk = Walk {
        opts,
        summary: ScanSummary::default(),
        rejected: Vec::new(),
    };
    let mut groups = Vec::new();
    for entry in walk.entries(root)? {
        match entry.kind {
            EntryKind::Dir => groups.push(walk.group(entry)?),
            EntryKind::File => walk.reject(entry, RejectedLevel::Root),
        }
    }

    let tree = ScanTree {
        groups,
        rejected: walk.rejected,
    };
    Ok((tree, walk.summary))
}

/// Regular files directly inside a packfile directory, sorted by name and filtered the same
/// way as the rest of the scan.
pub fn packfile_files(dir: &Path, opts: &DiscoverOptions) -> Result<Vec<Attachment>> {
    let walk = Walk {
        opts,
        summary: ScanSummary::default(),
        rejected: Vec::new(),
    };
    Ok(walk
        .entries(dir)?
        .into_iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(Entry::into_attachment)
        .collect())
}

struct Walk<'a> {
    opts: &'a DiscoverOptions,
    summary: ScanSummary,
    rejected: Vec<RejectedFile>,
}

impl Walk<'_> {
    fn group(&mut self, dir: Entry) -> Result<GroupNode> {
        self.summary.groups += 1;
        let mut projects = Vec::new();
        for entry in self.entries(&dir.path)? {
            match entry.kind {
                EntryKind::Dir => projects.push(self.project(entry)?),
                EntryKind::File => self.reject(entry, RejectedLevel::Group),
            }
        }
        Ok(GroupNode {
            name: dir.name,
            presence: Presence::Unknown,
            projects,
        })
    }

    fn project(&mut self, dir: Entry) -> Result<ProjectNode> {
        self.summary.projects += 1;
        let mut attachments = Vec::new();
        let mut subjects = Vec::new();
        for entry in self.entries(&dir.path)? {
            match entry.kind {
                EntryKind::Dir => subjects.push(self.subject(entry)?),
                EntryKind::File => attachments.push(self.attachment(entry)),
            }
        }
        Ok(ProjectNode {
            label: dir.name,
            presence: Presence::Unknown,
            attachments,
            subjects,
        })
    }

    fn subject(&mut self, dir: Entry) -> Result<SubjectNode> {
        self.summary.subjects += 1;
        let mut sessions = Vec::new();
        for entry in self.entries(&dir.path)? {
            match entry.kind {
                EntryKind::Dir => sessions.push(self.session(entry, &dir.name)?),
                EntryKind::File => self.reject(entry, RejectedLevel::Subject),
            }
        }
        Ok(SubjectNode {
            code: dir.name,
            sessions,
        })
    }

    fn session(&mut self, dir: Entry, subject_code: &str) -> Result<SessionNode> {
        self.summary.sessions += 1;
        let mut attachments = Vec::new();
        let mut acquisitions = Vec::new();
        for entry in self.entries(&dir.path)? {
            match entry.kind {
                EntryKind::Dir => acquisitions.push(self.acquisition(entry)?),
                EntryKind::File => attachments.push(self.attachment(entry)),
            }
        }
        Ok(SessionNode {
            label: dir.name,
            subject_code: subject_code.to_string(),
            presence: Presence::Unknown,
            attachments,
            acquisitions,
        })
    }

    fn acquisition(&mut self, dir: Entry) -> Result<AcquisitionNode> {
        self.summary.acquisitions += 1;
        let mut attachments = Vec::new();
        let mut packfiles = Vec::new();
        for entry in self.entries(&dir.path)? {
            match entry.kind {
                EntryKind::Dir => {
                    self.summary.packfiles += 1;
                    packfiles.push(Packfile {
                        kind: entry.name,
                        path: entry.path,
                    });
                }
                EntryKind::File => attachments.push(self.attachment(entry)),
            }
        }
        Ok(AcquisitionNode {
            label: dir.name,
            presence: Presence::Unknown,
            attachments,
            packfiles,
        })
    }

    fn attachment(&mut self, entry: Entry) -> Attachment {
        self.summary.attachments += 1;
        entry.into_attachment()
    }

    fn reject(&mut self, entry: Entry, level: RejectedLevel) {
        debug!(path = %entry.path.display(), ?level, "file has no attachment point");
        self.rejected.push(RejectedFile {
            path: entry.path,
            level,
        });
    }

    fn entries(&self, dir: &Path) -> Result<Vec<Entry>> {
        let mut children: Vec<fs::DirEntry> = fs::read_dir(dir)
            .with_context(|| format!("read dir {}", dir.display()))?
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("collect dir entries for {}", dir.display()))?;
        children.sort_by_key(|c| c.file_name());

        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let name = child
                .file_name()
                .into_string()
                .map_err(|_| anyhow!("non-utf8 filename in {}", dir.display()))?;
            if name.starts_with('.') || self.opts.excludes(&name) {
                continue;
            }

            let path = child.path();
            let mut file_type = child
                .file_type()
                .with_context(|| format!("read file type of {}", path.display()))?;
            if file_type.is_symlink() {
                if !self.opts.follow_symlinks {
                    debug!(path = %path.display(), "skipping symlink");
                    continue;
                }
                file_type = fs::metadata(&path)
                    .with_context(|| format!("follow symlink {}", path.display()))?
                    .file_type();
            }

            let entry = if file_type.is_dir() {
                Entry {
                    name,
                    path,
                    kind: EntryKind::Dir,
                    size: 0,
                }
            } else if file_type.is_file() {
                let size = fs::metadata(&path)
                    .with_context(|| format!("stat {}", path.display()))?
                    .len();
                Entry {
                    name,
                    path,
                    kind: EntryKind::File,
                    size,
                }
            } else {
                continue;
            };
            out.push(entry);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../tests/import/discover_tests.rs"]
mod tests;
