use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{HttpAnalysisBackend, ReviewController, WorkflowState};
use shared::domain::{format_file_size, CvFile};
use tracing::info;

mod settings;

use settings::load_settings;

#[derive(Parser, Debug)]
#[command(name = "cv-review", about = "Upload a resume to the CV review service and print the report")]
struct Args {
    /// Path to a .pdf or .docx resume
    file: PathBuf,
    /// Analysis service origin; overrides cv-review.toml and CV_REVIEW_SERVER_URL
    #[arg(long)]
    server_url: Option<String>,
    /// Give up on the request after this many seconds (no timeout by default)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = load_settings();

    let server_url = args.server_url.unwrap_or(settings.server_url);
    let timeout = args
        .timeout_secs
        .or(settings.timeout_secs)
        .map(Duration::from_secs);

    let bytes = fs::read(&args.file)
        .with_context(|| format!("failed to read '{}'", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let file = CvFile::new(name, bytes);

    let mut backend = HttpAnalysisBackend::new(server_url.as_str());
    if let Some(timeout) = timeout {
        backend = backend.with_timeout(timeout);
    }
    let controller = ReviewController::new(Arc::new(backend));

    if !controller.select_file(file).await {
        bail!(
            "unsupported file type: '{}' (expected .pdf or .docx)",
            args.file.display()
        );
    }

    let snapshot = controller.snapshot().await;
    if let Some(selected) = &snapshot.file {
        println!(
            "Analyzing {} ({})...",
            selected.name,
            format_file_size(selected.size_bytes)
        );
    }
    info!(server_url = %server_url, "contacting analysis service");

    controller.submit().await;

    let snapshot = controller.snapshot().await;
    match snapshot.workflow {
        WorkflowState::Succeeded => {
            let report = snapshot
                .report
                .context("workflow succeeded without a report")?;
            println!();
            println!(
                "Report for {} (candidate: {})",
                report.file_name,
                report.candidate_display()
            );
            println!();
            println!("Summary");
            println!("  {}", report.summary);
            println!();
            println!("Skills");
            for item in report.skill_items() {
                println!("  - {item}");
            }
            println!();
            println!("Feedback");
            for (index, item) in report.feedback_items().iter().enumerate() {
                println!("  {}. {item}", index + 1);
            }
            Ok(())
        }
        WorkflowState::Failed => {
            let message = snapshot
                .error
                .unwrap_or_else(|| "analysis failed".to_string());
            bail!(message);
        }
        state => bail!("unexpected workflow state after submit: {state:?}"),
    }
}
