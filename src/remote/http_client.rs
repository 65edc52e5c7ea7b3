use super::*;

/// Maps a non-success response to an error that carries the server's explanation.
pub(super) fn check_response(
    resp: reqwest::blocking::Response,
    label: &str,
) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        anyhow::bail!("unauthorized (API key invalid or expired; run `treeport login --url ... --api-key ...`)");
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        anyhow::bail!("forbidden (insufficient permissions for {})", label);
    }
    let body = resp.text().unwrap_or_default();
    anyhow::bail!("{} failed ({}): {}", label, status, error_message(&body))
}

/// Prefers the `message`/`error` field of a JSON error body, else the raw text.
pub(super) fn error_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = v.get(key).and_then(|x| x.as_str()) {
                return msg.to_string();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        "<empty response>".to_string()
    } else {
        body.to_string()
    }
}

impl RemoteClient {
    pub(super) fn auth(&self) -> String {
        format!("scitran-user {}", self.api_key)
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(super) fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        label: &str,
    ) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(body)
            .send()
            .with_context(|| format!("{} request", label))?;
        check_response(resp, label)?
            .json()
            .with_context(|| format!("parse {} response", label))
    }
}

#[cfg(test)]
#[path = "../tests/remote/http_client_tests.rs"]
mod tests;
