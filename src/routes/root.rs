use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Welcome {
    message: &'static str,
    endpoints: [&'static str; 3],
}

async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to GreenHeart.ai API",
        endpoints: [
            "/api/v1/analyze-leaf",
            "/api/v1/recommend-crops",
            "/api/v1/recommend-crops/list",
        ],
    })
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(welcome))
}
