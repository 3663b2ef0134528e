use serde_json::{Map, Value};

use super::{AnalysisResult, ChangeRecord};

pub const FALLBACK_TITLE: &str = "⚠️ Analysis unavailable";
pub const FALLBACK_ANALYSIS: &str =
    "The AI response could not be parsed for this leg. Please retry.";

const FIELDS: [&str; 3] = ["legId", "title", "analysis"];

/// Why a reply could not be used.
#[derive(Debug)]
pub enum FallbackReason {
    Decode(serde_json::Error),
    Shape(String),
    Empty,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::Decode(e) => write!(f, "reply is not valid JSON: {}", e),
            FallbackReason::Shape(msg) => write!(f, "reply has the wrong shape: {}", msg),
            FallbackReason::Empty => write!(f, "reply is an empty list"),
        }
    }
}

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(Vec<AnalysisResult>),
    Fallback(FallbackReason),
}

impl ParseOutcome {
    pub fn into_results(self, records: &[ChangeRecord]) -> Vec<AnalysisResult> {
        match self {
            ParseOutcome::Parsed(results) => results,
            ParseOutcome::Fallback(_) => fallback(records),
        }
    }
}

/// Normalizes a model reply into per-leg results.
///
/// Never fails. Any reply that is not a non-empty JSON array of analysis
/// objects becomes one fallback result per record, in record order.
pub fn parse(raw: &str, records: &[ChangeRecord]) -> Vec<AnalysisResult> {
    let outcome = classify(raw);

    if let ParseOutcome::Fallback(reason) = &outcome {
        tracing::warn!("Failed to use Bedrock response, using fallback: {}", reason);
    }

    outcome.into_results(records)
}

/// Results are passed through as the model sent them: no filtering,
/// reordering or cross-checking against the input legs.
pub fn classify(raw: &str) -> ParseOutcome {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return ParseOutcome::Fallback(FallbackReason::Decode(e)),
    };

    let Value::Array(items) = value else {
        return ParseOutcome::Fallback(FallbackReason::Shape("top level is not an array".into()));
    };

    if items.is_empty() {
        return ParseOutcome::Fallback(FallbackReason::Empty);
    }

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match to_result(item) {
            Ok(result) => results.push(result),
            Err(msg) => {
                return ParseOutcome::Fallback(FallbackReason::Shape(format!(
                    "item {}: {}",
                    index, msg
                )))
            }
        }
    }

    ParseOutcome::Parsed(results)
}

pub fn fallback(records: &[ChangeRecord]) -> Vec<AnalysisResult> {
    records
        .iter()
        .map(|record| AnalysisResult {
            leg_id: record.leg_id.clone(),
            title: FALLBACK_TITLE.to_string(),
            analysis: FALLBACK_ANALYSIS.to_string(),
        })
        .collect()
}

fn to_result(item: &Value) -> Result<AnalysisResult, String> {
    let Value::Object(object) = item else {
        return Err("not an object".into());
    };

    let [leg_id, title, analysis] = FIELDS.map(|name| field(object, name));

    Ok(AnalysisResult {
        leg_id: leg_id?,
        title: title?,
        analysis: analysis?,
    })
}

/// Case-insensitive field lookup. Missing or null fields read as empty text.
fn field(object: &Map<String, Value>, name: &str) -> Result<String, String> {
    let value = object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value);

    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("field '{}' is not a string: {}", name, other)),
    }
}
