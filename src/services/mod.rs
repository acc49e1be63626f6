// src/services/mod.rs
pub mod analysis_service;
pub mod gateway;
pub mod image_processor;

pub use analysis_service::AnalysisService;
pub use gateway::{Gateway, HttpGateway};
pub use image_processor::ImageProcessor;
