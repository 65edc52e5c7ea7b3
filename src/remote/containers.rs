//! Container creation: groups, projects, sessions, acquisitions.

use super::*;

impl RemoteClient {
    pub fn add_group(&self, id: &str) -> Result<RemoteId> {
        let created: CreatedResponse = self.post_json(
            "/api/groups",
            &CreateGroupRequest {
                id: id.to_string(),
                label: id.to_string(),
            },
            "create group",
        )?;
        Ok(created.id)
    }

    pub fn add_project(&self, group: &RemoteId, label: &str) -> Result<RemoteId> {
        let created: CreatedResponse = self.post_json(
            "/api/projects",
            &CreateProjectRequest {
                group: group.clone(),
                label: label.to_string(),
            },
            "create project",
        )?;
        Ok(created.id)
    }

    pub fn add_session(
        &self,
        project: &RemoteId,
        label: &str,
        subject_code: &str,
    ) -> Result<RemoteId> {
        let created: CreatedResponse = self.post_json(
            "/api/sessions",
            &CreateSessionRequest {
                project: project.clone(),
                label: label.to_string(),
                subject: SubjectRef {
                    code: subject_code.to_string(),
                },
            },
            "create session",
        )?;
        Ok(created.id)
    }

    pub fn add_acquisition(&self, session: &RemoteId, label: &str) -> Result<RemoteId> {
        let created: CreatedResponse = self.post_json(
            "/api/acquisitions",
            &CreateAcquisitionRequest {
                session: session.clone(),
                label: label.to_string(),
            },
            "create acquisition",
        )?;
        Ok(created.id)
    }
}
