//! Prompt assembly for the generation service.
//!
//! Both prompts are plain text. Only the sensor itemization and the
//! season/region tokens vary between calls; the instructional frames are
//! fixed.

use crate::models::{NormalizedSensorReading, SensorField, SENSOR_FIELD_COUNT};

/// Region assumed when a caller does not name one.
pub const DEFAULT_REGION: &str = "India";

const DIAGNOSIS_PROMPT: &str = "\
You are a highly skilled plant pathologist specializing in the diagnosis and treatment of plant diseases. \
Your task is to analyze the provided data, which includes an image of a plant and sensor readings, \
to identify any diseases, infestations, or other issues. Structure your response as follows:

1. **Disease Identification**: Analyze the provided image and sensor data to detect any diseases, pests, or deficiencies.
2. **Detailed Findings**: Provide in-depth findings on the identified issues, including possible causes and severity.
3. **Recommended Actions**: Suggest effective treatment options, preventive measures, and further actions.
4. **Preventive Measures**: Offer recommendations to prevent recurrence.
5. **Expert Recommendations**: Provide long-term health and disease management strategies.

If the condition is unrecognizable, say \"I don't know\". \
If the image is not plant-related, respond with \"Please upload a valid plant image.\"
";

/// Reply the model is told to give for an unrecognizable condition.
pub const UNKNOWN_CONDITION_REPLY: &str = "I don't know";

/// Reply the model is told to give for an image that shows no plant.
pub const NOT_A_PLANT_REPLY: &str = "Please upload a valid plant image.";

// ---

/// Each field with its display value and unit, in positional order.
fn sensor_items(reading: &NormalizedSensorReading) -> [(SensorField, String); SENSOR_FIELD_COUNT] {
    SensorField::ALL.map(|field| {
        let value = match field {
            SensorField::Nitrogen => reading.nitrogen.to_string(),
            SensorField::Phosphorus => reading.phosphorus.to_string(),
            SensorField::Potassium => reading.potassium.to_string(),
            SensorField::Temperature => format!("{}°C", reading.temperature),
            SensorField::SoilFertility => reading.soil_fertility.to_string(),
            SensorField::Moisture => format!("{}%", reading.moisture),
        };
        (field, value)
    })
}

/// Numbered itemization of a normalized reading, with units.
pub fn format_sensor_block(reading: &NormalizedSensorReading) -> String {
    // ---
    let mut block = String::from(
        "Based on the following soil and environmental conditions, suggest the best crop for maximum yield:\n",
    );

    for (i, (field, value)) in sensor_items(reading).iter().enumerate() {
        block.push_str(&format!("{}. {}: {}\n", i + 1, field.label(), value));
    }

    block
}

/// Single-line form of a reading, used as diagnosis context.
pub fn format_sensor_summary(reading: &NormalizedSensorReading) -> String {
    sensor_items(reading)
        .iter()
        .map(|(field, value)| format!("{}: {}", field.label(), value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the crop recommendation prompt.
///
/// `season` and `region` are interpolated verbatim.
pub fn build_recommendation_prompt(
    reading: &NormalizedSensorReading,
    season: &str,
    region: &str,
) -> String {
    // ---
    format!(
        "You are an agricultural expert in {region}. Based on the following detailed soil and environmental sensor data, \
recommend crops that are most suitable for cultivation in this region.
{sensors}
The season is {season} in {region}.
Consider the specific growing conditions in {region}, and provide a list of crops that will produce high yields \
with minimal maintenance during the current season. Be certain and specific in your recommendations based on the \
sensor data provided, and ensure that the crops suggested are well-suited for agriculture in {region}.
Your response should not be ambiguous. Do not say things like 'I am not sure' or 'I cannot be certain'. \
Instead, provide clear, confident recommendations for the best crops to grow in these conditions.
",
        sensors = format_sensor_block(reading),
    )
}

/// The fixed plant disease diagnosis instructions.
pub fn build_diagnosis_prompt() -> &'static str {
    DIAGNOSIS_PROMPT
}

/// Diagnosis instructions with a trailing sensor context line.
pub fn build_diagnosis_prompt_with_context(sensor_context: &str) -> String {
    format!("{DIAGNOSIS_PROMPT}\nSensor Data: {sensor_context}")
}
