//! Authenticated HTTP route registration.

use axum::extract::DefaultBodyLimit;

use super::*;

pub(super) fn authed_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/self", get(whoami))
        .route("/api/resolve", post(resolve))
        .route("/api/groups", post(create_group))
        .route("/api/projects", post(create_project))
        .route("/api/sessions", post(create_session))
        .route("/api/acquisitions", post(create_acquisition))
        .route("/api/projects/:id/files", post(upload_project_files))
        .route("/api/sessions/:id/files", post(upload_session_files))
        .route("/api/acquisitions/:id/files", post(upload_acquisition_files))
        .route("/api/projects/:id/packfile-start", post(packfile_start))
        .route("/api/projects/:id/packfile", post(packfile_stream))
        .route("/api/projects/:id/packfile-end", get(packfile_end))
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(state, require_api_key))
}
