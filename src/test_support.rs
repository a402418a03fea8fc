//! Local HTTP stubs for exercising the outbound clients.

use axum::{http::StatusCode, Router};

/// Serve `body` with `status` for every request and return the base URL.
pub(crate) async fn spawn_stub(status: StatusCode, body: &'static str) -> String {
    // ---
    let app = Router::new().fallback(move || async move { (status, body) });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}
