// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::errors::LeafscanError;

/// Server-side handle for an uploaded image. Immutable once received;
/// later analyze calls reference it by `image_id` only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub image_id: String,
    pub filename: String,
    pub file_size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A locally selected file, already validated and (if needed) downscaled,
/// ready to go out as the multipart `file` field.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl StagedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Image,
    Symptoms,
    Care,
}

impl AnalysisMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Symptoms => "symptoms",
            Self::Care => "care",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "Image Analysis",
            Self::Symptoms => "Symptoms Analysis",
            Self::Care => "Care Tips",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysisRequest {
    pub image_id: String,
}

impl ImageAnalysisRequest {
    pub fn validate(&self) -> Result<(), LeafscanError> {
        if self.image_id.trim().is_empty() {
            return Err(LeafscanError::Validation(
                "No uploaded image to analyze".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomsAnalysisRequest {
    pub symptoms_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,
}

impl SymptomsAnalysisRequest {
    pub fn validate(&self) -> Result<(), LeafscanError> {
        if self.symptoms_description.trim().is_empty() {
            return Err(LeafscanError::Validation(
                "Please describe the symptoms you observed".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantCareRequest {
    pub plant_type: String,
}

impl PlantCareRequest {
    pub fn validate(&self) -> Result<(), LeafscanError> {
        if self.plant_type.trim().is_empty() {
            return Err(LeafscanError::Validation(
                "Please specify a plant type".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the user asked for, across all three modes. Kept for echo and for
/// the unified `AnalysisService::analyze` entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Image(ImageAnalysisRequest),
    Symptoms(SymptomsAnalysisRequest),
    Care(PlantCareRequest),
}

impl AnalysisRequest {
    pub const fn mode(&self) -> AnalysisMode {
        match self {
            Self::Image(_) => AnalysisMode::Image,
            Self::Symptoms(_) => AnalysisMode::Symptoms,
            Self::Care(_) => AnalysisMode::Care,
        }
    }

    pub fn validate(&self) -> Result<(), LeafscanError> {
        match self {
            Self::Image(request) => request.validate(),
            Self::Symptoms(request) => request.validate(),
            Self::Care(request) => request.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageReport {
    pub plant_identification: String,
    pub health_status: Option<String>,
    pub confidence: Option<String>,
    pub primary_issue: Option<String>,
    pub quick_summary: Option<String>,
    pub immediate_action: Option<String>,
    pub treatment: Option<String>,
    pub prevention: Option<String>,
    pub detailed_analysis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomsReport {
    pub likely_condition: String,
    pub severity: Option<String>,
    pub confidence: Option<String>,
    pub quick_summary: Option<String>,
    pub immediate_action: Option<String>,
    pub treatment_steps: Option<String>,
    pub what_to_watch: Option<String>,
    pub detailed_analysis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EssentialCare {
    pub light: Option<String>,
    pub water: Option<String>,
    pub soil: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareReport {
    pub care_difficulty: String,
    pub quick_overview: Option<String>,
    pub essential_care: Option<EssentialCare>,
    #[serde(default)]
    pub key_tips: Vec<String>,
    #[serde(default)]
    pub common_problems: Vec<String>,
    pub detailed_guide: Option<String>,
}

pub const IMAGE_DISCRIMINATOR: &str = "plant_identification";
pub const SYMPTOMS_DISCRIMINATOR: &str = "likely_condition";
pub const CARE_DISCRIMINATOR: &str = "care_difficulty";

/// The three response shapes the backend can return, discriminated once at
/// the network boundary and carried as a tagged union from then on.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Image(ImageReport),
    Symptoms(SymptomsReport),
    Care(CareReport),
}

impl AnalysisResult {
    /// Structural discrimination: exactly one of the three marker fields must
    /// be present. Zero or several markers is a decode error, never a
    /// silent default.
    pub fn from_value(value: Value) -> Result<Self, LeafscanError> {
        let object = value.as_object().ok_or_else(|| {
            LeafscanError::Decode("analysis response is not a JSON object".to_string())
        })?;

        let has = |key: &str| object.get(key).is_some_and(|v| !v.is_null());
        let image = has(IMAGE_DISCRIMINATOR);
        let symptoms = has(SYMPTOMS_DISCRIMINATOR);
        let care = has(CARE_DISCRIMINATOR);

        match (image, symptoms, care) {
            (true, false, false) => serde_json::from_value(value)
                .map(Self::Image)
                .map_err(|e| LeafscanError::Decode(format!("malformed image analysis: {e}"))),
            (false, true, false) => serde_json::from_value(value)
                .map(Self::Symptoms)
                .map_err(|e| LeafscanError::Decode(format!("malformed symptoms analysis: {e}"))),
            (false, false, true) => serde_json::from_value(value)
                .map(Self::Care)
                .map_err(|e| LeafscanError::Decode(format!("malformed care guide: {e}"))),
            (false, false, false) => Err(LeafscanError::Decode(
                "response carries no known discriminator field".to_string(),
            )),
            _ => Err(LeafscanError::Decode(
                "response carries more than one discriminator field".to_string(),
            )),
        }
    }

    pub const fn mode(&self) -> AnalysisMode {
        match self {
            Self::Image(_) => AnalysisMode::Image,
            Self::Symptoms(_) => AnalysisMode::Symptoms,
            Self::Care(_) => AnalysisMode::Care,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub analysis_type: AnalysisMode,
    pub timestamp: DateTime<Utc>,
    pub request_data: Value,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPage {
    pub history: Vec<HistoryEntry>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryDetail {
    pub id: String,
    pub analysis_type: AnalysisMode,
    pub timestamp: DateTime<Utc>,
    pub request_data: Value,
    pub response_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImagePage {
    pub images: Vec<UploadedImage>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}
