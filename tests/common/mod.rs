use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

pub struct ServerGuard {
    pub base_url: String,
    pub api_key: String,
    _dir: tempfile::TempDir,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_server() -> Result<ServerGuard> {
    let dir = tempfile::tempdir().context("create server tempdir")?;

    let api_key = "dev-key".to_string();

    let addr_file = dir.path().join("addr.txt");

    let child = Command::new(env!("CARGO_BIN_EXE_treeport-server"))
        .args([
            "--addr",
            "127.0.0.1:0",
            "--addr-file",
            addr_file.to_str().unwrap(),
            "--api-key",
            &api_key,
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn treeport-server")?;

    let base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&base_url)?;

    Ok(ServerGuard {
        base_url,
        api_key,
        _dir: dir,
        child,
    })
}

fn read_addr_file(addr_file: &Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }

        if let Ok(s) = std::fs::read_to_string(addr_file) {
            let s = s.trim();
            if !s.is_empty() {
                return Ok(format!("http://{}", s));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("server did not become healthy at {}/healthz", base_url);
        }
        match client.get(format!("{}/healthz", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

#[allow(dead_code)]
pub fn auth_header(api_key: &str) -> String {
    format!("scitran-user {}", api_key)
}

/// Mutation log of the dev server, oldest first.
#[allow(dead_code)]
pub fn events(server: &ServerGuard) -> Result<Vec<serde_json::Value>> {
    let events: Vec<serde_json::Value> = reqwest::blocking::Client::new()
        .get(format!("{}/debug/events", server.base_url))
        .send()
        .context("fetch debug events")?
        .error_for_status()
        .context("debug events status")?
        .json()
        .context("parse debug events")?;
    Ok(events)
}

#[allow(dead_code)]
pub fn event_kinds(server: &ServerGuard) -> Result<Vec<String>> {
    Ok(events(server)?
        .iter()
        .filter_map(|e| e["kind"].as_str().map(str::to_string))
        .collect())
}

/// Runs the CLI with its credential store isolated under `config_dir`.
#[allow(dead_code)]
pub fn run_treeport(config_dir: &Path, args: &[&str], stdin: &str) -> Result<Output> {
    use std::io::Write;

    let mut child = Command::new(env!("CARGO_BIN_EXE_treeport"))
        .args(args)
        .env("TREEPORT_CONFIG_DIR", config_dir)
        .env_remove("TREEPORT_URL")
        .env_remove("TREEPORT_API_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn treeport {:?}", args))?;
    if let Some(mut input) = child.stdin.take() {
        // The child may exit without reading; a broken pipe here is not a failure.
        let _ = input.write_all(stdin.as_bytes());
    }
    child
        .wait_with_output()
        .with_context(|| format!("wait for treeport {:?}", args))
}

#[allow(dead_code)]
pub fn touch(root: &Path, rel: &str, bytes: &[u8]) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
