// src/controllers/symptoms.rs
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::LeafscanError;
use crate::models::{SymptomsAnalysisRequest, SymptomsReport};
use crate::services::AnalysisService;

use super::{lock, CompletionHook, OperationState};

#[derive(Debug, Clone, Default)]
struct SymptomsState {
    operation: OperationState<SymptomsReport>,
    validation_error: Option<String>,
    last_request: Option<SymptomsAnalysisRequest>,
}

/// Drives the symptoms-description analysis flow:
/// Idle -> Pending -> Succeeded | Failed, with synchronous field validation
/// short-circuiting before any network call.
pub struct SymptomsController {
    service: Arc<AnalysisService>,
    state: Mutex<SymptomsState>,
    generation: AtomicU64,
    on_complete: Option<CompletionHook<SymptomsReport>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomsSnapshot {
    pub state: OperationState<SymptomsReport>,
    pub validation_error: Option<String>,
    pub last_request: Option<SymptomsAnalysisRequest>,
}

impl SymptomsController {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            state: Mutex::new(SymptomsState::default()),
            generation: AtomicU64::new(0),
            on_complete: None,
        }
    }

    pub fn with_completion_hook(mut self, hook: CompletionHook<SymptomsReport>) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub async fn analyze(
        &self,
        symptoms_description: &str,
        plant_type: Option<&str>,
    ) -> Result<(), LeafscanError> {
        let request = SymptomsAnalysisRequest {
            symptoms_description: symptoms_description.to_string(),
            plant_type: plant_type
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
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

        let outcome = self.service.analyze_symptoms(&request).await;

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) != generation {
            // The controller moved on (reset or newer submission); this
            // response is stale and must not touch state.
            debug!("dropping stale symptoms response");
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
        *state = SymptomsState::default();
    }

    pub fn dismiss_error(&self) {
        let mut state = lock(&self.state);
        if state.operation.is_failed() {
            state.operation = OperationState::Idle;
        }
        state.validation_error = None;
    }

    pub fn snapshot(&self) -> SymptomsSnapshot {
        let state = lock(&self.state);
        SymptomsSnapshot {
            state: state.operation.clone(),
            validation_error: state.validation_error.clone(),
            last_request: state.last_request.clone(),
        }
    }
}
