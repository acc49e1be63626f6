// src/services/analysis_service.rs
use log::info;
use reqwest::Method;
use std::sync::Arc;

use crate::errors::LeafscanError;
use crate::models::{
    AnalysisMode, AnalysisRequest, AnalysisResult, CareReport, HistoryDetail, HistoryPage,
    ImageAnalysisRequest, ImageReport, PlantCareRequest, StagedFile, SymptomsAnalysisRequest,
    SymptomsReport, UploadedImage, UploadedImagePage,
};
use crate::services::gateway::Gateway;

/// Typed facade over the analysis API: one thin method per endpoint, each
/// with its own fallback message for failures that carry no server `detail`.
pub struct AnalysisService {
    gateway: Arc<dyn Gateway>,
}

impl AnalysisService {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn upload_image(&self, file: StagedFile) -> Result<UploadedImage, LeafscanError> {
        if file.data.is_empty() {
            return Err(LeafscanError::Validation(
                "Select an image before uploading".to_string(),
            ));
        }
        info!("uploading {} ({} bytes)", file.filename, file.data.len());
        let value = self
            .gateway
            .send_multipart("/analysis/upload", file)
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Upload failed")))?;
        serde_json::from_value(value)
            .map_err(|e| LeafscanError::Decode(format!("malformed upload response: {e}")))
    }

    pub async fn analyze_image(
        &self,
        request: &ImageAnalysisRequest,
    ) -> Result<ImageReport, LeafscanError> {
        request.validate()?;
        info!("requesting image analysis for {}", request.image_id);
        let body = serde_json::to_value(request)
            .map_err(|e| LeafscanError::Decode(e.to_string()))?;
        let value = self
            .gateway
            .send_json(Method::POST, "/analysis/analyze", Some(body), &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Analysis failed")))?;
        match AnalysisResult::from_value(value)? {
            AnalysisResult::Image(report) => Ok(report),
            other => Err(LeafscanError::Decode(format!(
                "expected an image analysis, got a {} result",
                other.mode()
            ))),
        }
    }

    pub async fn analyze_symptoms(
        &self,
        request: &SymptomsAnalysisRequest,
    ) -> Result<SymptomsReport, LeafscanError> {
        request.validate()?;
        let body = serde_json::to_value(request)
            .map_err(|e| LeafscanError::Decode(e.to_string()))?;
        let value = self
            .gateway
            .send_json(Method::POST, "/analysis/symptoms", Some(body), &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Analysis failed")))?;
        match AnalysisResult::from_value(value)? {
            AnalysisResult::Symptoms(report) => Ok(report),
            other => Err(LeafscanError::Decode(format!(
                "expected a symptoms analysis, got a {} result",
                other.mode()
            ))),
        }
    }

    pub async fn get_care_tips(
        &self,
        request: &PlantCareRequest,
    ) -> Result<CareReport, LeafscanError> {
        request.validate()?;
        let body = serde_json::to_value(request)
            .map_err(|e| LeafscanError::Decode(e.to_string()))?;
        let value = self
            .gateway
            .send_json(Method::POST, "/analysis/care-tips", Some(body), &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to get care tips")))?;
        match AnalysisResult::from_value(value)? {
            AnalysisResult::Care(report) => Ok(report),
            other => Err(LeafscanError::Decode(format!(
                "expected a care guide, got a {} result",
                other.mode()
            ))),
        }
    }

    /// Unified entry point dispatching on the request variant.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, LeafscanError> {
        match request {
            AnalysisRequest::Image(request) => {
                self.analyze_image(request).await.map(AnalysisResult::Image)
            }
            AnalysisRequest::Symptoms(request) => self
                .analyze_symptoms(request)
                .await
                .map(AnalysisResult::Symptoms),
            AnalysisRequest::Care(request) => {
                self.get_care_tips(request).await.map(AnalysisResult::Care)
            }
        }
    }

    pub async fn get_history(
        &self,
        limit: u64,
        skip: u64,
        analysis_type: Option<AnalysisMode>,
    ) -> Result<HistoryPage, LeafscanError> {
        let mut query = vec![
            ("limit".to_string(), limit.to_string()),
            ("skip".to_string(), skip.to_string()),
        ];
        if let Some(mode) = analysis_type {
            query.push(("analysis_type".to_string(), mode.as_str().to_string()));
        }
        let value = self
            .gateway
            .send_json(Method::GET, "/analysis/history", None, &query)
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to fetch history")))?;
        serde_json::from_value(value)
            .map_err(|e| LeafscanError::Decode(format!("malformed history response: {e}")))
    }

    pub async fn get_history_detail(
        &self,
        analysis_id: &str,
    ) -> Result<HistoryDetail, LeafscanError> {
        let path = format!("/analysis/history/{analysis_id}");
        let value = self
            .gateway
            .send_json(Method::GET, &path, None, &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to fetch history")))?;
        serde_json::from_value(value)
            .map_err(|e| LeafscanError::Decode(format!("malformed history detail: {e}")))
    }

    pub async fn delete_analysis(&self, analysis_id: &str) -> Result<(), LeafscanError> {
        let path = format!("/analysis/history/{analysis_id}");
        self.gateway
            .send_json(Method::DELETE, &path, None, &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to delete analysis")))?;
        info!("deleted analysis {analysis_id}");
        Ok(())
    }

    pub async fn get_uploaded_images(
        &self,
        limit: u64,
        skip: u64,
    ) -> Result<UploadedImagePage, LeafscanError> {
        let query = vec![
            ("limit".to_string(), limit.to_string()),
            ("skip".to_string(), skip.to_string()),
        ];
        let value = self
            .gateway
            .send_json(Method::GET, "/analysis/images", None, &query)
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to fetch images")))?;
        serde_json::from_value(value)
            .map_err(|e| LeafscanError::Decode(format!("malformed image list: {e}")))
    }

    pub async fn delete_image(&self, image_id: &str) -> Result<(), LeafscanError> {
        let path = format!("/analysis/images/{image_id}");
        self.gateway
            .send_json(Method::DELETE, &path, None, &[])
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to delete image")))?;
        info!("deleted image {image_id}");
        Ok(())
    }

    /// Raw image bytes, for display only.
    pub async fn fetch_image_view(&self, image_id: &str) -> Result<Vec<u8>, LeafscanError> {
        let path = format!("/analysis/images/{image_id}/view");
        self.gateway
            .fetch_bytes(&path)
            .await
            .map_err(|e| LeafscanError::Gateway(e.with_fallback("Failed to load image")))
    }

    pub fn image_view_url(&self, image_id: &str) -> String {
        self.gateway
            .url_for(&format!("/analysis/images/{image_id}/view"))
    }
}
