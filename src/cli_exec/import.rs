use treeport::import::{DiscoverOptions, ImportOptions, TerminalPrompter, import_folder};

use super::*;
use crate::cli_commands::import::ImportArgs;

pub(super) fn handle_import_command(args: ImportArgs) -> Result<()> {
    let opts = ImportOptions {
        discover: DiscoverOptions::new(&args.exclude, args.symlinks)?,
        assume_yes: args.yes,
        show_progress: !args.no_progress,
    };
    let client = open_client()?;

    let mut prompter = TerminalPrompter::stdio();
    let mut out = std::io::stdout();
    import_folder(&client, &args.folder, &opts, &mut prompter, &mut out)?;
    Ok(())
}
