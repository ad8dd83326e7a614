use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AppConfig;

/// Failures of the remote dart-detection collaborator. Transport and
/// protocol only — the engine itself never produces these.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("No dart detection endpoint is configured.")]
    NoEndpoint,
    #[error("Detection request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Detection service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// One normalized dart impact as reported by the detection service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DartDetection {
    pub x: f64,
    pub y: f64,
    pub score: u32,
    pub sector: String,
    pub confidence: f64,
}

/// The service's wire shape varies between deployments; every field is
/// optional and several aliases are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDartDetection {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub score: Option<f64>,
    pub base_score: Option<f64>,
    pub value: Option<f64>,
    pub multiplier: Option<String>,
    pub ring: Option<String>,
    pub sector: Option<String>,
    pub confidence: Option<f64>,
    pub probability: Option<f64>,
    pub position: Option<RawPoint>,
    pub point: Option<RawPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

// ── Client ─────────────────────────────────────────────────────────────

pub struct DetectionClient {
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl DetectionClient {
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Result<Self, DetectionError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(DetectionError::NoEndpoint);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(DetectionClient { endpoint, http })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DetectionError> {
        DetectionClient::new(
            config.detection_endpoint.clone(),
            config.detection_timeout_ms,
        )
    }

    /// One request/response round trip: post a board photo, get back the
    /// normalized throws. No retry or deduplication happens here.
    pub fn detect(&self, base64_image: &str) -> Result<Vec<DartDetection>, DetectionError> {
        let body = json!({ "image": to_data_uri(base64_image) });
        let response = self.http.post(&self.endpoint).json(&body).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DetectionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let payload: Value = response.json()?;
        let detections = extract_detections(&payload);
        debug!(count = detections.len(), "dart detections normalized");
        Ok(detections)
    }
}

/// Total for one turn: at most three darts count.
pub fn turn_score(detections: &[DartDetection]) -> u32 {
    detections.iter().take(3).map(|d| d.score).sum()
}

// ── Payload normalization ──────────────────────────────────────────────

fn to_data_uri(image: &str) -> String {
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{image}")
    }
}

fn extract_detections(payload: &Value) -> Vec<DartDetection> {
    let list = ["detections", "darts", "results"]
        .iter()
        .find_map(|key| payload.get(*key))
        .unwrap_or(payload);
    let Some(items) = list.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<RawDartDetection>(item.clone()).ok())
        .filter_map(|raw| normalize_detection(&raw))
        .collect()
}

/// Turn a loosely-shaped raw detection into a typed one. Detections with
/// no usable coordinates are dropped.
pub fn normalize_detection(raw: &RawDartDetection) -> Option<DartDetection> {
    let fallback = raw.position.as_ref().or(raw.point.as_ref());
    let x = raw.x.or_else(|| fallback.and_then(|p| p.x))?;
    let y = raw.y.or_else(|| fallback.and_then(|p| p.y))?;

    let base = raw
        .base_score
        .or(raw.score)
        .or(raw.value)
        .unwrap_or(0.0)
        .round() as u32;
    let multiplier = normalize_multiplier(raw.multiplier.as_deref().or(raw.ring.as_deref()));
    let score = compute_score(base, &multiplier, raw.score);
    let sector = compute_sector(score, base, &multiplier, raw.sector.as_deref());
    let confidence = raw
        .confidence
        .or(raw.probability)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    Some(DartDetection {
        x,
        y,
        score,
        sector,
        confidence,
    })
}

fn normalize_multiplier(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "simple".to_string();
    };
    let lower = value.to_lowercase();
    if lower.starts_with('d') {
        return "double".to_string();
    }
    if lower.starts_with('t') {
        return "triple".to_string();
    }
    if lower.contains("bull") && lower.contains("double") {
        return "bull-double".to_string();
    }
    if lower.contains("bull") {
        return "bull".to_string();
    }
    lower
}

fn compute_score(base: u32, multiplier: &str, provided: Option<f64>) -> u32 {
    if let Some(value) = provided {
        if value.is_finite() && value > 0.0 {
            return value.round() as u32;
        }
    }
    if base == 25 && multiplier.contains("double") {
        return 50;
    }
    if base == 25 || multiplier.starts_with("bull") {
        return if multiplier.contains("double") { 50 } else { 25 };
    }
    let factor = match multiplier {
        "double" => 2,
        "triple" => 3,
        _ => 1,
    };
    base * factor
}

fn compute_sector(score: u32, base: u32, multiplier: &str, provided: Option<&str>) -> String {
    if let Some(provided) = provided {
        return provided.to_string();
    }
    if score == 50 {
        return "Bull double".to_string();
    }
    if score == 25 {
        return "Bull simple".to_string();
    }
    let value = if base > 0 { base } else { score };
    match multiplier {
        "double" => format!("Double {value}"),
        "triple" => format!("Triple {value}"),
        _ => format!("Simple {value}"),
    }
}
