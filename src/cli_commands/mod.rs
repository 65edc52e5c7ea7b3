use clap::Subcommand;

pub(crate) mod identity;
pub(crate) mod import;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Log in to a remote (verify the API key, then store it)
    Login(identity::LoginArgs),

    /// Log out (delete stored credentials)
    Logout,

    /// Show the logged-in user and remote URL
    Status,

    /// Import a local folder into the remote hierarchy
    Import(import::ImportArgs),
}
