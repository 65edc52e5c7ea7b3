use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub(crate) struct ImportArgs {
    /// Folder laid out as group/project/subject/session/acquisition
    pub(crate) folder: PathBuf,

    /// Upload without asking for confirmation
    #[arg(short = 'y', long)]
    pub(crate) yes: bool,

    /// Follow symlinks instead of skipping them
    #[arg(long)]
    pub(crate) symlinks: bool,

    /// Skip entries whose name matches this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub(crate) exclude: Vec<String>,

    /// Do not draw upload progress bars
    #[arg(long)]
    pub(crate) no_progress: bool,
}
