//! The recommendation and diagnosis pipelines shared by every front-end.
//!
//! Front-ends only marshal transport input into [`RawSensorReading`] and
//! [`ImageAttachment`]; everything from normalization to the generation call
//! happens here.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::client::{ImageAttachment, TextGenerator};
use crate::detection::LeafDetector;
use crate::error::Result;
use crate::models::{NormalizedSensorReading, RawSensorReading};
use crate::normalizer::normalize;
use crate::prompt::{
    build_diagnosis_prompt, build_diagnosis_prompt_with_context, build_recommendation_prompt,
    format_sensor_summary,
};

/// Outcome of a crop recommendation request.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(rename = "sensor_readings")]
    pub reading: NormalizedSensorReading,
    pub season: String,
    pub region: String,
    pub analysis: String,
}

/// Outcome of a leaf diagnosis request.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub analysis: String,
    /// Annotated JPEG from the detection service, when one is configured.
    pub annotated_image: Option<Vec<u8>>,
    pub reading: Option<NormalizedSensorReading>,
}

#[derive(Clone)]
pub struct Advisor {
    generator: Arc<dyn TextGenerator>,
    detector: Option<Arc<dyn LeafDetector>>,
    default_region: String,
}

impl Advisor {
    pub fn new(generator: Arc<dyn TextGenerator>, default_region: impl Into<String>) -> Self {
        Self {
            generator,
            detector: None,
            default_region: default_region.into(),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn LeafDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    /// Normalize the reading, build the prompt and ask for a recommendation.
    pub async fn recommend(
        &self,
        raw: &RawSensorReading,
        season: &str,
        region: Option<&str>,
    ) -> Result<Recommendation> {
        // ---
        let region = region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(self.default_region.as_str());

        let reading = normalize(raw, &mut rand::thread_rng());
        if !reading.synthesized.is_empty() {
            info!(fields = ?reading.synthesized, "Synthesized fallback sensor values");
        }

        let prompt = build_recommendation_prompt(&reading, season, region);
        debug!("Recommendation prompt:\n{}", prompt);

        let analysis = self.generator.generate(&prompt, None).await?;

        Ok(Recommendation {
            reading,
            season: season.to_string(),
            region: region.to_string(),
            analysis,
        })
    }

    /// Annotate the image (when a detector is configured) and ask for a
    /// diagnosis, optionally with sensor context.
    pub async fn diagnose(
        &self,
        image: &ImageAttachment,
        sensors: Option<&RawSensorReading>,
    ) -> Result<Diagnosis> {
        // ---
        let annotated_image = match &self.detector {
            Some(detector) => Some(detector.annotate(image).await?),
            None => None,
        };

        let reading = sensors.map(|raw| normalize(raw, &mut rand::thread_rng()));
        let prompt = match &reading {
            Some(reading) => build_diagnosis_prompt_with_context(&format_sensor_summary(reading)),
            None => build_diagnosis_prompt().to_string(),
        };

        let analysis = self.generator.generate(&prompt, Some(image)).await?;

        Ok(Diagnosis {
            analysis,
            annotated_image,
            reading,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::Error;
    use crate::models::SensorValue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt and answers with a canned reply.
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<(String, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str, image: Option<&ImageAttachment>) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), image.is_some()));
            if self.fail {
                return Err(Error::ContentBlocked("SAFETY".to_string()));
            }
            Ok("Grow millet.".to_string())
        }
    }

    struct StaticDetector;

    struct DownDetector;

    #[async_trait]
    impl LeafDetector for DownDetector {
        async fn annotate(&self, _image: &ImageAttachment) -> Result<Vec<u8>> {
            Err(Error::UpstreamUnavailable("detection: status 500".to_string()))
        }
    }

    #[async_trait]
    impl LeafDetector for StaticDetector {
        async fn annotate(&self, _image: &ImageAttachment) -> Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }
    }

    fn scenario() -> RawSensorReading {
        RawSensorReading::try_from(vec![
            SensorValue::from(45_i64),
            SensorValue::from(-5_i64),
            SensorValue::from(30_i64),
            SensorValue::from(22.5),
            SensorValue::from("VeryHigh"),
            SensorValue::from(150_i64),
        ])
        .unwrap()
    }

    #[test]
    fn test_mixed_input_end_to_end() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India");

        let rec = tokio_test::block_on(advisor.recommend(&scenario(), "summer", None)).unwrap();

        assert_eq!(rec.analysis, "Grow millet.");
        assert_eq!(rec.region, "India");
        assert_eq!(rec.reading.nitrogen.to_string(), "45");
        assert_eq!(rec.reading.potassium.to_string(), "30");
        assert_eq!(rec.reading.temperature.to_string(), "22.5");

        let phosphorus = rec.reading.phosphorus.as_i64().unwrap();
        assert!((10..=60).contains(&phosphorus));
        let moisture = rec.reading.moisture.as_i64().unwrap();
        assert!((30..=70).contains(&moisture));

        let prompts = recorder.prompts.lock().unwrap();
        let (prompt, with_image) = &prompts[0];
        assert!(!*with_image);
        for needle in ["Nitrogen: 45", "Potassium: 30", "Temperature: 22.5°C", "summer"] {
            assert!(prompt.contains(needle), "prompt is missing {needle:?}");
        }
    }

    #[test]
    fn test_valid_input_prompts_are_identical() {
        // ---
        let raw = RawSensorReading::parse_literal("[50, 50, 50, 25.0, 'Medium', 60.0]").unwrap();
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India");

        for _ in 0..100 {
            let rec = tokio_test::block_on(advisor.recommend(&raw, "summer", None)).unwrap();
            assert!(rec.reading.synthesized.is_empty());
        }

        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 100);
        assert!(prompts.iter().all(|p| p.0 == prompts[0].0));
        for needle in [
            "Nitrogen: 50",
            "Phosphorus: 50",
            "Potassium: 50",
            "Temperature: 25.0°C",
            "Soil Fertility: Medium",
            "Moisture: 60.0%",
        ] {
            assert!(prompts[0].0.contains(needle), "prompt is missing {needle:?}");
        }
    }

    #[test]
    fn test_explicit_region_overrides_default() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India");

        let rec =
            tokio_test::block_on(advisor.recommend(&scenario(), "winter", Some("Kenya"))).unwrap();
        assert_eq!(rec.region, "Kenya");

        let rec = tokio_test::block_on(advisor.recommend(&scenario(), "winter", Some("  "))).unwrap();
        assert_eq!(rec.region, "India");
    }

    #[test]
    fn test_season_and_region_pass_through_verbatim() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India");

        let rec = tokio_test::block_on(advisor.recommend(&scenario(), " summer ", Some(" Kenya ")))
            .unwrap();
        assert_eq!(rec.season, " summer ");
        assert_eq!(rec.region, " Kenya ");

        let prompts = recorder.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("The season is  summer  in  Kenya ."));
    }

    #[test]
    fn test_generation_failure_propagates() {
        // ---
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let advisor = Advisor::new(recorder, "India");

        let err = tokio_test::block_on(advisor.recommend(&scenario(), "summer", None)).unwrap_err();
        assert!(matches!(err, Error::ContentBlocked(_)));
    }

    #[test]
    fn test_diagnosis_sends_image_and_context() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India").with_detector(Arc::new(StaticDetector));
        let image = ImageAttachment::jpeg(vec![0xff, 0xd8]);

        let diagnosis = tokio_test::block_on(advisor.diagnose(&image, Some(&scenario()))).unwrap();

        assert_eq!(diagnosis.annotated_image, Some(vec![1, 2, 3]));
        assert!(diagnosis.reading.is_some());

        let prompts = recorder.prompts.lock().unwrap();
        let (prompt, with_image) = &prompts[0];
        assert!(*with_image);
        assert!(prompt.starts_with(build_diagnosis_prompt()));
        assert!(prompt.contains("\nSensor Data: Nitrogen: 45, "));
    }

    #[test]
    fn test_detector_failure_stops_diagnosis() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India").with_detector(Arc::new(DownDetector));
        let image = ImageAttachment::jpeg(vec![0xff, 0xd8]);

        let err = tokio_test::block_on(advisor.diagnose(&image, None)).unwrap_err();

        assert!(matches!(err, Error::UpstreamUnavailable(_)));
        assert!(recorder.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_diagnosis_without_detector_or_context() {
        // ---
        let recorder = Arc::new(Recorder::default());
        let advisor = Advisor::new(recorder.clone(), "India");
        let image = ImageAttachment::jpeg(vec![0xff, 0xd8]);

        let diagnosis = tokio_test::block_on(advisor.diagnose(&image, None)).unwrap();

        assert!(diagnosis.annotated_image.is_none());
        assert!(diagnosis.reading.is_none());
        assert_eq!(recorder.prompts.lock().unwrap()[0].0, build_diagnosis_prompt());
    }
}
