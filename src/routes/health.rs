use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Liveness {
    status: &'static str,
    version: &'static str,
}

/// Answers as soon as the listener is up; the model is loaded before that.
pub async fn healthcheck() -> Json<Liveness> {
    Json(Liveness {
        status: "Available",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{get_request, json_body, test_app};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthcheck() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), None);

        let response = app.router.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "Available");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
