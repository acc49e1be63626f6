// src/lib.rs
pub mod controllers;
pub mod errors;
pub mod models;
pub mod render;
pub mod services;
pub mod session;

pub use controllers::{
    CareController, HistoryController, ImageWorkflowController, SymptomsController,
};
pub use errors::{GatewayError, LeafscanError};
pub use services::{AnalysisService, Gateway, HttpGateway, ImageProcessor};
pub use session::Session;
