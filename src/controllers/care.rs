// src/controllers/care.rs
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::LeafscanError;
use crate::models::{CareReport, PlantCareRequest};
use crate::services::AnalysisService;

use super::{lock, CompletionHook, OperationState};

#[derive(Debug, Clone, Default)]
struct CareState {
    operation: OperationState<CareReport>,
    validation_error: Option<String>,
    last_request: Option<PlantCareRequest>,
}

/// Care-tips flow, same shape as the symptoms controller: a plant type in,
/// a care guide out.
pub struct CareController {
    service: Arc<AnalysisService>,
    state: Mutex<CareState>,
    generation: AtomicU64,
    on_complete: Option<CompletionHook<CareReport>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareSnapshot {
    pub state: OperationState<CareReport>,
    pub validation_error: Option<String>,
    pub last_request: Option<PlantCareRequest>,
}

impl CareController {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            state: Mutex::new(CareState::default()),
            generation: AtomicU64::new(0),
            on_complete: None,
        }
    }

    pub fn with_completion_hook(mut self, hook: CompletionHook<CareReport>) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub async fn get_tips(&self, plant_type: &str) -> Result<(), LeafscanError> {
        let request = PlantCareRequest {
            plant_type: plant_type.to_string(),
        };

        let generation = {
            let mut state = lock(&self.state);
            if let Err(err) = request.validate() {
                state.validation_error = Some(err.to_string());
                return Err(err);
            }
            if state.operation.is_pending() {
                return Err(LeafscanError::Busy);
            }
            state.validation_error = None;
            state.operation = OperationState::Pending;
            state.last_request = Some(request.clone());
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let outcome = self.service.get_care_tips(&request).await;

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale care-tips response");
            return Ok(());
        }
        match outcome {
            Ok(report) => {
                state.operation = OperationState::Succeeded(report.clone());
                drop(state);
                if let Some(hook) = &self.on_complete {
                    hook(&report);
                }
                Ok(())
            }
            Err(err) => {
                state.operation = OperationState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = CareState::default();
    }

    pub fn dismiss_error(&self) {
        let mut state = lock(&self.state);
        if state.operation.is_failed() {
            state.operation = OperationState::Idle;
        }
        state.validation_error = None;
    }

    pub fn snapshot(&self) -> CareSnapshot {
        let state = lock(&self.state);
        CareSnapshot {
            state: state.operation.clone(),
            validation_error: state.validation_error.clone(),
            last_request: state.last_request.clone(),
        }
    }
}
