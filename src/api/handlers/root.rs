use axum::{http::StatusCode, response::IntoResponse};

// Undocumented helper route so load balancers hitting `/` get a cheap answer.
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, env!("CARGO_PKG_NAME"))
}
