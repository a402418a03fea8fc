use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::{ApiError, Envelope};
use crate::advisor::Recommendation;
use crate::models::{RawSensorReading, SensorValue};
use crate::Advisor;

// ---

pub fn router() -> Router<Advisor> {
    // ---
    Router::new()
        .route("/api/v1/recommend-crops", post(named_handler))
        .route("/api/v1/recommend-crops/list", post(list_handler))
}

/// Six named readings. Each field accepts any JSON value; wrong types are
/// absorbed by normalization.
#[derive(Debug, Deserialize)]
struct NamedRequest {
    #[serde(flatten)]
    sensors: RawSensorReading,
    season: String,
    region: Option<String>,
}

/// Positional readings, either as a JSON array or as a text literal.
#[derive(Debug, Deserialize)]
struct ListRequest {
    sensor_data: SensorList,
    season: String,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SensorList {
    Values(Vec<SensorValue>),
    Literal(String),
}

impl TryFrom<SensorList> for RawSensorReading {
    type Error = crate::Error;

    fn try_from(list: SensorList) -> Result<Self, Self::Error> {
        match list {
            SensorList::Values(values) => RawSensorReading::try_from(values),
            SensorList::Literal(text) => RawSensorReading::parse_literal(&text),
        }
    }
}

async fn named_handler(
    State(advisor): State<Advisor>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Json<Envelope<Recommendation>>, ApiError> {
    // ---
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();
    let span = info_span!("recommend_crops", %request_id);

    async move {
        info!("POST /api/v1/recommend-crops - season={}", req.season);
        let rec = advisor
            .recommend(&req.sensors, &req.season, req.region.as_deref())
            .await?;
        Ok::<_, ApiError>(Envelope::ok(request_id, rec))
    }
    .instrument(span)
    .await
}

async fn list_handler(
    State(advisor): State<Advisor>,
    payload: Result<Json<ListRequest>, JsonRejection>,
) -> Result<Json<Envelope<Recommendation>>, ApiError> {
    // ---
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();
    let span = info_span!("recommend_crops_list", %request_id);

    async move {
        info!("POST /api/v1/recommend-crops/list - season={}", req.season);
        let sensors = RawSensorReading::try_from(req.sensor_data)?;
        let rec = advisor
            .recommend(&sensors, &req.season, req.region.as_deref())
            .await?;
        Ok::<_, ApiError>(Envelope::ok(request_id, rec))
    }
    .instrument(span)
    .await
}
