use super::*;

pub(crate) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub(crate) async fn debug_events(State(state): State<Arc<AppState>>) -> Json<Vec<Event>> {
    let hierarchy = state.hierarchy.read().await;
    Json(hierarchy.events.clone())
}

pub(crate) async fn whoami() -> Json<RemoteUser> {
    Json(RemoteUser {
        id: "dev@example.org".to_string(),
        firstname: Some("Dev".to_string()),
        lastname: Some("User".to_string()),
    })
}

pub(crate) async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return unauthorized();
    };
    let Ok(value) = value.to_str() else {
        return unauthorized();
    };
    let Some(key) = value.strip_prefix("scitran-user ") else {
        return unauthorized();
    };
    if key != state.api_key {
        warn!(path = %req.uri().path(), "rejected API key");
        return unauthorized();
    }
    next.run(req).await
}
