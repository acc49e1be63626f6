// src/render.rs
use std::fmt;

use crate::models::{AnalysisResult, CareReport, ImageReport, SymptomsReport};

/// Presentational severity bucket. The mapping is total: anything the model
/// invents that we do not recognize lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityTier {
    Healthy,
    Mild,
    Moderate,
    Severe,
    Unknown,
}

impl SeverityTier {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "healthy" => Self::Healthy,
            "mild" => Self::Mild,
            "moderate" => Self::Moderate,
            "severe" => Self::Severe,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CareDifficulty {
    Easy,
    Moderate,
    Difficult,
    Unknown,
}

impl CareDifficulty {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "moderate" => Self::Moderate,
            "difficult" => Self::Difficult,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Difficult => "difficult",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CareDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFact {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub label: &'static str,
    pub body: String,
}

/// Framework-neutral projection of an analysis result: fixed labeled
/// sections per variant, with anything absent on the wire simply omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub title: &'static str,
    pub summary: Option<String>,
    pub severity: Option<SeverityTier>,
    pub severity_label: Option<String>,
    pub confidence: Option<String>,
    pub difficulty: Option<CareDifficulty>,
    pub difficulty_label: Option<String>,
    pub facts: Vec<ReportFact>,
    pub sections: Vec<ReportSection>,
    pub tips: Vec<String>,
    pub problems: Vec<String>,
    pub detail: Option<String>,
}

pub fn render(result: &AnalysisResult) -> RenderedReport {
    match result {
        AnalysisResult::Image(report) => render_image(report),
        AnalysisResult::Symptoms(report) => render_symptoms(report),
        AnalysisResult::Care(report) => render_care(report),
    }
}

fn render_image(report: &ImageReport) -> RenderedReport {
    let mut facts = vec![ReportFact {
        label: "Plant",
        value: report.plant_identification.clone(),
    }];
    push_fact(&mut facts, "Issue", &report.primary_issue);

    let mut sections = Vec::new();
    push_section(
        &mut sections,
        "Immediate Action Required",
        &report.immediate_action,
    );
    push_section(&mut sections, "Treatment Plan", &report.treatment);
    push_section(&mut sections, "Prevention Strategies", &report.prevention);

    RenderedReport {
        title: "Analysis Results",
        summary: report.quick_summary.clone(),
        severity: report.health_status.as_deref().map(SeverityTier::from_label),
        severity_label: report.health_status.clone(),
        confidence: report.confidence.clone(),
        difficulty: None,
        difficulty_label: None,
        facts,
        sections,
        tips: Vec::new(),
        problems: Vec::new(),
        detail: report.detailed_analysis.clone(),
    }
}

fn render_symptoms(report: &SymptomsReport) -> RenderedReport {
    let facts = vec![ReportFact {
        label: "Likely Condition",
        value: report.likely_condition.clone(),
    }];

    let mut sections = Vec::new();
    push_section(
        &mut sections,
        "Immediate Action Required",
        &report.immediate_action,
    );
    push_section(&mut sections, "Treatment Steps", &report.treatment_steps);
    push_section(&mut sections, "What to Monitor", &report.what_to_watch);

    RenderedReport {
        title: "Analysis Results",
        summary: report.quick_summary.clone(),
        severity: report.severity.as_deref().map(SeverityTier::from_label),
        severity_label: report.severity.clone(),
        confidence: report.confidence.clone(),
        difficulty: None,
        difficulty_label: None,
        facts,
        sections,
        tips: Vec::new(),
        problems: Vec::new(),
        detail: report.detailed_analysis.clone(),
    }
}

fn render_care(report: &CareReport) -> RenderedReport {
    let mut sections = Vec::new();
    if let Some(care) = &report.essential_care {
        push_section(&mut sections, "Light Requirements", &care.light);
        push_section(&mut sections, "Watering Guidelines", &care.water);
        push_section(&mut sections, "Soil Requirements", &care.soil);
    }

    RenderedReport {
        title: "Care Instructions",
        summary: report.quick_overview.clone(),
        severity: None,
        severity_label: None,
        confidence: None,
        difficulty: Some(CareDifficulty::from_label(&report.care_difficulty)),
        difficulty_label: Some(report.care_difficulty.clone()),
        facts: Vec::new(),
        sections,
        tips: report.key_tips.clone(),
        problems: report.common_problems.clone(),
        detail: report.detailed_guide.clone(),
    }
}

fn push_fact(facts: &mut Vec<ReportFact>, label: &'static str, value: &Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            facts.push(ReportFact {
                label,
                value: value.clone(),
            });
        }
    }
}

fn push_section(sections: &mut Vec<ReportSection>, label: &'static str, body: &Option<String>) {
    if let Some(body) = body {
        if !body.trim().is_empty() {
            sections.push(ReportSection {
                label,
                body: body.clone(),
            });
        }
    }
}
