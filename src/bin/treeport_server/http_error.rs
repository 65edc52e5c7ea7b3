use super::*;

pub(super) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"message": "unauthorized"})),
    )
        .into_response()
}

pub(super) fn bad_request(err: anyhow::Error) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"message": format!("{:#}", err)})),
    )
        .into_response()
}

pub(super) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"message": "not found"})),
    )
        .into_response()
}

pub(super) fn conflict(msg: &str) -> Response {
    (
        StatusCode::CONFLICT,
        Json(serde_json::json!({"message": msg})),
    )
        .into_response()
}

pub(super) fn internal_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"message": format!("{:#}", err)})),
    )
        .into_response()
}

/// Plain-text error; `packfile-end` clients surface the body verbatim.
pub(super) fn text_error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, msg.into()).into_response()
}
