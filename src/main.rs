// src/main.rs
use anyhow::Context;
use log::info;
use std::env;
use std::path::Path;
use std::sync::Arc;

use leafscan::controllers::{
    CareController, HistoryController, ImageWorkflowController, SymptomsController,
};
use leafscan::models::AnalysisResult;
use leafscan::render::{render, RenderedReport};
use leafscan::services::{AnalysisService, Gateway, HttpGateway};
use leafscan::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let base_url =
        env::var("LEAFSCAN_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let session = Arc::new(Session::new());
    if let Ok(token) = env::var("LEAFSCAN_API_TOKEN") {
        session.set_token(token);
    }

    info!("using API at {base_url}");
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(base_url, session));
    let service = Arc::new(AnalysisService::new(gateway));

    let args: Vec<String> = env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "care" => run_care(service, rest).await,
        Some((command, rest)) if command == "symptoms" => run_symptoms(service, rest).await,
        Some((command, rest)) if command == "image" => run_image(service, rest).await,
        Some((command, _)) if command == "history" => run_history(service).await,
        _ => {
            usage();
            std::process::exit(2);
        }
    }
}

fn usage() {
    eprintln!("usage: leafscan <command>");
    eprintln!("  care <plant-type>                 get a care guide");
    eprintln!("  symptoms <description> [plant]    analyze a symptom description");
    eprintln!("  image <path>                      upload and analyze a photo");
    eprintln!("  history                           list recent analyses");
    eprintln!();
    eprintln!("environment: LEAFSCAN_API_URL, LEAFSCAN_API_TOKEN");
}

async fn run_care(service: Arc<AnalysisService>, args: &[String]) -> anyhow::Result<()> {
    let plant_type = args.first().context("usage: leafscan care <plant-type>")?;
    let controller = CareController::new(service);
    controller.get_tips(plant_type).await?;
    let snapshot = controller.snapshot();
    if let Some(report) = snapshot.state.result() {
        print_report(&render(&AnalysisResult::Care(report.clone())));
    }
    Ok(())
}

async fn run_symptoms(service: Arc<AnalysisService>, args: &[String]) -> anyhow::Result<()> {
    let description = args
        .first()
        .context("usage: leafscan symptoms <description> [plant]")?;
    let plant_type = args.get(1).map(String::as_str);
    let controller = SymptomsController::new(service);
    controller.analyze(description, plant_type).await?;
    let snapshot = controller.snapshot();
    if let Some(report) = snapshot.state.result() {
        print_report(&render(&AnalysisResult::Symptoms(report.clone())));
    }
    Ok(())
}

async fn run_image(service: Arc<AnalysisService>, args: &[String]) -> anyhow::Result<()> {
    let path = args.first().context("usage: leafscan image <path>")?;
    let path = Path::new(path);
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo.jpg");

    let controller = ImageWorkflowController::new(service)
        .with_completion_hook(Arc::new(|_| info!("analysis complete")));
    controller.select_file(filename, content_type_for(path), data)?;
    controller.upload().await?;
    if let Some(image) = controller.snapshot().uploaded {
        info!(
            "uploaded {} as {} ({} bytes)",
            image.filename, image.image_id, image.file_size
        );
    }
    controller.analyze().await?;
    if let Some(report) = controller.snapshot().report {
        print_report(&render(&AnalysisResult::Image(report)));
    }
    Ok(())
}

async fn run_history(service: Arc<AnalysisService>) -> anyhow::Result<()> {
    let controller = HistoryController::new(service);
    controller.refresh().await?;
    let snapshot = controller.snapshot();
    println!("{} analyses ({} shown)", snapshot.total, snapshot.entries.len());
    for entry in &snapshot.entries {
        println!(
            "  {}  {:<17} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.analysis_type.label(),
            entry.preview.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn print_report(report: &RenderedReport) {
    println!("== {} ==", report.title);
    if let Some(summary) = &report.summary {
        println!("{summary}");
    }
    if let (Some(tier), Some(label)) = (report.severity, &report.severity_label) {
        println!("severity: {label} ({tier})");
    }
    if let (Some(tier), Some(label)) = (report.difficulty, &report.difficulty_label) {
        println!("difficulty: {label} ({tier})");
    }
    if let Some(confidence) = &report.confidence {
        println!("confidence: {confidence}");
    }
    for fact in &report.facts {
        println!("{}: {}", fact.label, fact.value);
    }
    for section in &report.sections {
        println!("\n-- {} --\n{}", section.label, section.body);
    }
    if !report.tips.is_empty() {
        println!("\n-- Expert Tips --");
        for tip in &report.tips {
            println!("  * {tip}");
        }
    }
    if !report.problems.is_empty() {
        println!("\n-- Common Problems --");
        for problem in &report.problems {
            println!("  * {problem}");
        }
    }
    if let Some(detail) = &report.detail {
        println!("\n-- Detailed Analysis --\n{detail}");
    }
}
