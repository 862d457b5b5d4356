/// External analyzer backend: a client of a DeepFace analysis service.
///
/// The service does its own face detection and preprocessing; this adapter
/// only ships the image and picks one face out of the report.
use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use image::ImageFormat;
use serde::Deserialize;

use crate::prediction::domain::backend_error::BackendError;
use crate::prediction::domain::emotion_distribution::EmotionDistribution;
use crate::prediction::domain::face_analyzer::FaceAnalyzer;
use crate::prediction::domain::prediction_result::RawPrediction;
use crate::shared::decoded_image::DecodedImage;

pub struct DeepFaceAnalyzer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    results: Vec<FaceReport>,
}

#[derive(Debug, Deserialize)]
struct FaceReport {
    emotion: BTreeMap<String, f64>,
    dominant_emotion: String,
    #[serde(default)]
    region: Option<ReportRegion>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportRegion {
    #[serde(default)]
    w: i64,
    #[serde(default)]
    h: i64,
}

impl DeepFaceAnalyzer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Analyzer(format!("failed to build HTTP client: {e}")))?;
        let endpoint = format!("{}/analyze", base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FaceAnalyzer for DeepFaceAnalyzer {
    fn analyze(&self, image: &DecodedImage) -> Result<RawPrediction, BackendError> {
        let body = serde_json::json!({
            "img": png_data_url(image)?,
            "actions": ["emotion"],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| BackendError::Analyzer(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(BackendError::Analyzer(format!(
                "service returned {status}: {text}"
            )));
        }

        let parsed: AnalyzeResponse = response
            .json()
            .map_err(|e| BackendError::Analyzer(format!("unreadable response: {e}")))?;
        select_report(parsed.results)
    }
}

/// Lossless re-encode of the decoded pixels for transport.
fn png_data_url(image: &DecodedImage) -> Result<String, BackendError> {
    let mut png = Vec::new();
    image
        .rgb()
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| BackendError::Analyzer(format!("failed to encode image: {e}")))?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// Keep the face with the largest region; the first one wins a tie.
fn select_report(results: Vec<FaceReport>) -> Result<RawPrediction, BackendError> {
    let mut best: Option<(i64, FaceReport)> = None;
    for report in results {
        let area = report.region.as_ref().map_or(0, |r| r.w * r.h);
        match best {
            Some((top, _)) if area <= top => {}
            _ => best = Some((area, report)),
        }
    }
    let (_, report) =
        best.ok_or_else(|| BackendError::Analyzer("no face in analyzer response".into()))?;
    Ok(RawPrediction {
        distribution: EmotionDistribution::new(report.emotion),
        dominant: report.dominant_emotion,
        confidence: None,
    })
}
