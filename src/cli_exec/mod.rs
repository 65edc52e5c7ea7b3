use anyhow::{Context, Result};

use treeport::remote::RemoteClient;
use treeport::store::CredentialStore;

use crate::{Commands, open_client};

mod identity;
mod import;

pub(super) fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => identity::handle_login_command(args.url, args.api_key)?,
        Commands::Logout => identity::handle_logout_command()?,
        Commands::Status => identity::handle_status_command()?,
        Commands::Import(args) => import::handle_import_command(args)?,
    }
    Ok(())
}
