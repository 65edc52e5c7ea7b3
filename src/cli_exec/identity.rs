use treeport::model::UserConfig;

use super::*;

pub(super) fn handle_login_command(url: String, api_key: String) -> Result<()> {
    let cfg = UserConfig::new(url, api_key);
    let client = RemoteClient::new(&cfg)?;
    let user = client
        .whoami()
        .with_context(|| format!("verify API key against {}", cfg.base_url))?;

    let store = CredentialStore::open_default()?;
    store.write(&cfg)?;
    println!("Logged in to {} as {}", cfg.base_url, user.display_name());
    Ok(())
}

pub(super) fn handle_logout_command() -> Result<()> {
    let store = CredentialStore::open_default()?;
    if store.clear()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub(super) fn handle_status_command() -> Result<()> {
    let client = open_client()?;
    let user = client.whoami()?;
    println!("url: {}", client.base_url());
    println!("user: {}", user.display_name());
    println!("user_id: {}", user.id);
    Ok(())
}
