//! Folder import: discover a local tree, match it against the remote, preview, inflate.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::remote::RemoteApi;

mod discover;
mod inflate;
mod matcher;
mod prompt;
mod report;
mod retry;

pub use self::discover::{DiscoverOptions, discover, packfile_files};
pub use self::inflate::{InflateReport, Inflater};
pub use self::matcher::match_tree;
pub use self::prompt::{Prompter, TerminalPrompter};
pub use self::report::render_preview;
pub use self::retry::{Canceled, with_retry};

#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    pub discover: DiscoverOptions,
    /// Skip the upload confirmation. Retry prompts are still asked.
    pub assume_yes: bool,
    pub show_progress: bool,
}

/// Imports the folder at `root` into the remote hierarchy.
///
/// Nothing remote is mutated before the user confirms the preview; declining returns
/// [`Canceled`].
pub fn import_folder(
    remote: &impl RemoteApi,
    root: &Path,
    opts: &ImportOptions,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<InflateReport> {
    let (mut tree, summary) = discover(root, &opts.discover)?;
    info!(root = %root.display(), groups = summary.groups, "scanned");
    if tree.is_empty() {
        render_preview(&tree, &summary, out)?;
        writeln!(out, "Nothing to import.")?;
        return Ok(InflateReport::default());
    }

    match_tree(&mut tree, remote).context("match local tree against remote")?;
    render_preview(&tree, &summary, out)?;

    if !opts.assume_yes && !prompter.confirm("Confirm upload?")? {
        writeln!(out, "Canceled.")?;
        return Err(Canceled.into());
    }
    writeln!(out, "Beginning upload.")?;
    writeln!(out)?;

    let report = Inflater::new(remote, &mut *prompter, &mut *out)
        .show_progress(opts.show_progress)
        .discover_options(opts.discover.clone())
        .run(tree)?;
    writeln!(
        out,
        "Done: {} containers created, {} files and {} packfiles uploaded.",
        report.containers_created(),
        report.attachments_uploaded,
        report.packfiles_uploaded
    )?;
    Ok(report)
}

#[cfg(test)]
#[path = "tests/import/testing.rs"]
pub(crate) mod testing;

#[cfg(test)]
#[path = "tests/import/import_tests.rs"]
mod tests;
