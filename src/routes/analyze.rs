use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::{ApiError, Envelope};
use crate::client::ImageAttachment;
use crate::models::{NormalizedSensorReading, RawSensorReading};
use crate::{Advisor, Error};

const ACCEPTED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

// ---

pub fn router() -> Router<Advisor> {
    // ---
    Router::new().route("/api/v1/analyze-leaf", post(handler))
}

#[derive(Debug, Serialize)]
struct DiagnosisBody {
    analysis: String,
    /// Base64-encoded annotated JPEG.
    #[serde(skip_serializing_if = "Option::is_none")]
    annotated_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensor_readings: Option<NormalizedSensorReading>,
}

async fn handler(
    State(advisor): State<Advisor>,
    multipart: Multipart,
) -> Result<Json<Envelope<DiagnosisBody>>, ApiError> {
    // ---
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze_leaf", %request_id);

    async move {
        info!("POST /api/v1/analyze-leaf");
        let (image, sensors) = read_upload(multipart).await?;

        let diagnosis = advisor.diagnose(&image, sensors.as_ref()).await?;

        Ok::<_, ApiError>(Envelope::ok(
            request_id,
            DiagnosisBody {
                analysis: diagnosis.analysis,
                annotated_image: diagnosis.annotated_image.map(|bytes| STANDARD.encode(bytes)),
                sensor_readings: diagnosis.reading,
            },
        ))
    }
    .instrument(span)
    .await
}

/// Pull the `file` part and the optional `sensor_data` part out of the form.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(ImageAttachment, Option<RawSensorReading>), ApiError> {
    // ---
    let mut image = None;
    let mut sensors = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                if !ACCEPTED_IMAGE_TYPES.contains(&mime.as_str()) {
                    return Err(Error::UnsupportedImage(
                        "only JPEG and PNG images are supported".to_string(),
                    )
                    .into());
                }
                let data = field.bytes().await?;
                debug!("Received {} bytes of {}", data.len(), mime);
                image = Some(ImageAttachment::new(mime, data.to_vec()));
            }
            Some("sensor_data") => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    sensors = Some(RawSensorReading::parse_literal(&text)?);
                }
            }
            _ => {}
        }
    }

    let image = image
        .filter(|img| !img.data.is_empty())
        .ok_or_else(|| Error::UnsupportedImage("a non-empty `file` part is required".to_string()))?;

    Ok((image, sensors))
}
