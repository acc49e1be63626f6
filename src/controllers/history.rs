// src/controllers/history.rs
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::LeafscanError;
use crate::models::{AnalysisMode, HistoryEntry};
use crate::services::AnalysisService;

use super::lock;

pub const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Debug, Clone, Default)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    total: u64,
    expanded: Option<String>,
    is_loading: bool,
    error: Option<String>,
    filter: Option<AnalysisMode>,
    skip: u64,
}

/// Server-ordered history list with at most one expanded entry. `refresh`
/// is a full reload replacing the local list; entries are removed locally
/// only after the server acknowledges a delete. A delete racing a refresh
/// can transiently reintroduce the deleted entry until the next reload;
/// that window is accepted.
pub struct HistoryController {
    service: Arc<AnalysisService>,
    state: Mutex<HistoryState>,
    generation: AtomicU64,
    page_size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub entries: Vec<HistoryEntry>,
    pub total: u64,
    pub expanded: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filter: Option<AnalysisMode>,
}

impl HistoryController {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            state: Mutex::new(HistoryState::default()),
            generation: AtomicU64::new(0),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn refresh(&self) -> Result<(), LeafscanError> {
        let (skip, filter, generation) = {
            let mut state = lock(&self.state);
            if state.is_loading {
                return Err(LeafscanError::Busy);
            }
            state.is_loading = true;
            state.error = None;
            (
                state.skip,
                state.filter,
                self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            )
        };

        let outcome = self.service.get_history(self.page_size, skip, filter).await;

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale history page");
            return Ok(());
        }
        state.is_loading = false;
        match outcome {
            Ok(page) => {
                // Full reload: the server response replaces the list wholesale.
                state.entries = page.history;
                state.total = page.total;
                if let Some(id) = state.expanded.clone() {
                    if !state.entries.iter().any(|e| e.id == id) {
                        state.expanded = None;
                    }
                }
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn delete(&self, analysis_id: &str) -> Result<(), LeafscanError> {
        match self.service.delete_analysis(analysis_id).await {
            Ok(()) => {
                let mut state = lock(&self.state);
                state.entries.retain(|e| e.id != analysis_id);
                state.total = state.total.saturating_sub(1);
                if state.expanded.as_deref() == Some(analysis_id) {
                    state.expanded = None;
                }
                Ok(())
            }
            Err(err) => {
                warn!("failed to delete analysis {analysis_id}: {err}");
                let mut state = lock(&self.state);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Expands an entry, collapsing whatever was expanded before; toggling
    /// the same id collapses it.
    pub fn toggle_expanded(&self, analysis_id: &str) {
        let mut state = lock(&self.state);
        if state.expanded.as_deref() == Some(analysis_id) {
            state.expanded = None;
        } else {
            state.expanded = Some(analysis_id.to_string());
        }
    }

    pub fn set_filter(&self, filter: Option<AnalysisMode>) {
        let mut state = lock(&self.state);
        if state.filter != filter {
            state.filter = filter;
            state.skip = 0;
        }
    }

    pub fn set_skip(&self, skip: u64) {
        let mut state = lock(&self.state);
        state.skip = skip;
    }

    pub fn dismiss_error(&self) {
        let mut state = lock(&self.state);
        state.error = None;
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = lock(&self.state);
        HistorySnapshot {
            entries: state.entries.clone(),
            total: state.total,
            expanded: state.expanded.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
            filter: state.filter,
        }
    }
}
