//! Wire types of the prediction service and validated response parsing.
//!
//! The service answers `POST /predict` with either
//!
//! ```json
//! { "tumor_info": { "name": "...", "description": "...", "severity": "...", "action": "..." },
//!   "confidence": 87.3,
//!   "all_probabilities": { "glioma": 87.3, "meningioma": 8.2 },
//!   "prediction": "glioma" }
//! ```
//!
//! or `{ "error": "..." }`. HTTP status is not consulted, only the body shape.
//! Bodies are treated as untrusted: a prediction is only produced when every
//! required field is present and every percentage is a finite number in
//! `0..=100`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TumorInfo {
    pub name: String,
    pub description: String,
    pub severity: String,
    /// Recommended next step
    pub action: String,
}

/// One label of the probability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub tumor_info: TumorInfo,
    pub confidence: f64,
    /// Every label with its probability, in the order the service sent them
    pub all_probabilities: Vec<Prediction>,
    /// Raw class key of the top label, when the service includes it
    pub prediction: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    Prediction(PredictionResult),
    Error(String),
}

#[derive(Deserialize)]
struct RawPrediction {
    tumor_info: TumorInfo,
    confidence: f64,
    all_probabilities: Map<String, Value>,
    #[serde(default)]
    prediction: Option<String>,
}

/// Parse a response body from the prediction service.
///
/// An `error` field wins over everything else. Anything that is neither a
/// service error nor a well-formed prediction is an
/// [`ClientError::InvalidResponse`].
pub fn parse_response(body: &str) -> Result<ServiceResponse, ClientError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Object(object) = value else {
        return Err(ClientError::InvalidResponse(
            "response is not a JSON object".to_string(),
        ));
    };

    if let Some(message) = object.get("error").and_then(error_message) {
        return Ok(ServiceResponse::Error(message));
    }

    let raw: RawPrediction = serde_json::from_value(Value::Object(object))?;
    raw.validate().map(ServiceResponse::Prediction)
}

/// Extract the message of an `error` field. Falsy values (`null`, `false`,
/// `0`, `""`) do not count as an error.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

impl RawPrediction {
    fn validate(self) -> Result<PredictionResult, ClientError> {
        check_percent("confidence", self.confidence)?;

        if self.all_probabilities.is_empty() {
            return Err(ClientError::InvalidResponse(
                "all_probabilities is empty".to_string(),
            ));
        }

        let all_probabilities = self
            .all_probabilities
            .into_iter()
            .map(|(class, value)| {
                let probability = value.as_f64().ok_or_else(|| {
                    ClientError::InvalidResponse(format!(
                        "probability for '{}' is not a number",
                        class
                    ))
                })?;
                check_percent(&format!("probability for '{}'", class), probability)?;
                Ok(Prediction { class, probability })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(PredictionResult {
            tumor_info: self.tumor_info,
            confidence: self.confidence,
            all_probabilities,
            prediction: self.prediction,
        })
    }
}

fn check_percent(what: &str, value: f64) -> Result<(), ClientError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ClientError::InvalidResponse(format!(
            "{} must be between 0 and 100, got {}",
            what, value
        )))
    }
}
