//! Three-step packfile protocol: start (token), stream (files), end (metadata).

use tracing::debug;

use super::*;

impl RemoteClient {
    pub fn start_packfile(&self, project: &RemoteId) -> Result<PackfileToken> {
        let resp = self
            .client
            .post(self.url(&format!("/api/projects/{}/packfile-start", project)))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .context("packfile start request")?;
        let start: PackfileStartResponse = check_response(resp, "packfile start")?
            .json()
            .context("parse packfile start response")?;

        match start.token {
            Some(token) if !token.is_empty() => Ok(PackfileToken(token)),
            _ => anyhow::bail!("packfile token was empty or missing"),
        }
    }

    pub fn stream_packfile(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle> {
        self.upload_simple(
            &format!("/api/projects/{}/packfile", project),
            &[("token", token.as_str())],
            None,
            sources,
        )
    }

    /// Blocks until the remote has finished assembling the packfile.
    ///
    /// A non-success response body is returned verbatim as the error.
    pub fn finish_packfile(
        &self,
        project: &RemoteId,
        token: &PackfileToken,
        metadata: &PackfileMetadata,
    ) -> Result<()> {
        let metadata = serde_json::to_string(metadata).context("serialize packfile metadata")?;
        let mut resp = self
            .client
            .get(self.url(&format!("/api/projects/{}/packfile-end", project)))
            .query(&[("token", token.as_str()), ("metadata", metadata.as_str())])
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .context("packfile end request")?;

        let status = resp.status();
        if status.is_success() {
            // The remote streams progress events until it is done; drain them.
            let drained = resp
                .copy_to(&mut std::io::sink())
                .context("wait for packfile completion")?;
            debug!(%project, drained, "packfile end");
            return Ok(());
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return check_response(resp, "packfile end").map(|_| ());
        }

        let body = resp.text().unwrap_or_default();
        if body.trim().is_empty() {
            anyhow::bail!("packfile end failed ({})", status);
        }
        anyhow::bail!("{}", body)
    }
}
