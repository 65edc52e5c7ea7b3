use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::model::UserConfig;

const CONFIG_DIR: &str = ".treeport";
const USER_FILE: &str = "user.json";

pub const CONFIG_DIR_ENV: &str = "TREEPORT_CONFIG_DIR";
pub const URL_ENV: &str = "TREEPORT_URL";
pub const API_KEY_ENV: &str = "TREEPORT_API_KEY";

/// On-disk home of the login credentials.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    root: PathBuf,
}

impl CredentialStore {
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// `$TREEPORT_CONFIG_DIR`, falling back to `$HOME/.treeport`.
    pub fn open_default() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::open(Path::new(&dir)));
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .ok_or_else(|| anyhow!("cannot locate home directory (set {})", CONFIG_DIR_ENV))?;
        Ok(Self::open(&Path::new(&home).join(CONFIG_DIR)))
    }

    pub fn user_path(&self) -> PathBuf {
        self.root.join(USER_FILE)
    }

    pub fn read(&self) -> Result<Option<UserConfig>> {
        let path = self.user_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let cfg: UserConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        if cfg.version != 1 {
            anyhow::bail!(
                "unsupported credential file version {} in {}",
                cfg.version,
                path.display()
            );
        }
        Ok(Some(cfg))
    }

    pub fn write(&self, cfg: &UserConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cfg).context("serialize credentials")?;
        write_atomic(&self.user_path(), &bytes).context("write credentials")?;
        Ok(())
    }

    /// Returns whether a credential file was removed.
    pub fn clear(&self) -> Result<bool> {
        let path = self.user_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        Ok(true)
    }

    /// Credentials for this invocation: the environment pair if both are set, else the file.
    pub fn require(&self) -> Result<UserConfig> {
        if let (Ok(url), Ok(key)) = (std::env::var(URL_ENV), std::env::var(API_KEY_ENV))
            && !url.is_empty()
            && !key.is_empty()
        {
            return Ok(UserConfig::new(url, key));
        }
        self.read()?
            .context("not logged in (run `treeport login --url ... --api-key ...`)")
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store/credential_tests.rs"]
mod tests;
