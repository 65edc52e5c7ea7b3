//! Path resolution against the remote hierarchy.

use tracing::debug;

use super::*;

impl RemoteClient {
    /// Resolves `path` segment by segment.
    ///
    /// A path that does not fully exist remotely comes back as an empty result, not an error.
    pub fn resolve_path(&self, path: &[String]) -> Result<ResolveResult> {
        let path: Vec<String> = match path.first() {
            Some(first) if first.is_empty() => Vec::new(),
            _ => path.to_vec(),
        };
        debug!(?path, "resolve");

        let resp = self
            .client
            .post(self.url("/api/resolve"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&ResolveRequest { path: path.clone() })
            .send()
            .context("resolve request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(?path, "resolve: not found");
            return Ok(ResolveResult::default());
        }

        let result: ResolveResult = check_response(resp, "resolve")?
            .json()
            .context("parse resolve response")?;
        Ok(result)
    }
}
