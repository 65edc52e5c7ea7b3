use super::*;

impl RemoteClient {
    pub fn whoami(&self) -> Result<RemoteUser> {
        let resp = self
            .client
            .get(self.url("/api/users/self"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .context("whoami")?;
        let user: RemoteUser = check_response(resp, "whoami")?
            .json()
            .context("parse whoami")?;
        Ok(user)
    }
}
