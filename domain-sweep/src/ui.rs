//! Terminal output for the domain-sweep CLI.
//!
//! Everything interesting goes to the log file; the terminal only gets a
//! header when a mode starts and a one-screen summary when it ends.

use console::style;
use domain_sweep_lib::{DetectMode, DetectSummary, ExportedScript, PreparedLength, StatusCounts};
use std::time::Duration;

const RULE: &str = "────────────────────────────────────────────────────";

/// Header line printed before a mode runs.
pub fn print_header(action: &str, detail: &str) {
    eprintln!("{} {}", style(action).cyan().bold(), style(detail).dim());
}

pub fn print_prepare_summary(prepared: &[PreparedLength], duration: Duration) {
    println!("  {}", style(RULE).dim());
    for p in prepared {
        println!(
            "  length {}  {}",
            style(p.length).bold(),
            style(format!("{} candidates", p.rows)).green()
        );
    }
    let total: usize = prepared.iter().map(|p| p.rows).sum();
    println!(
        "  {} candidate{} prepared in {:.1}s",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64()
    );
}

pub fn print_detect_summary(
    mode: DetectMode,
    summary: &DetectSummary,
    counts: Option<StatusCounts>,
    duration: Duration,
) {
    let label = match mode {
        DetectMode::Initial => "detect",
        DetectMode::Redetect => "redetect",
    };

    println!("  {}", style(RULE).dim());
    println!(
        "  {} {} row{} over {} page{} in {:.1}s",
        style(label).bold(),
        style(summary.processed).bold(),
        if summary.processed == 1 { "" } else { "s" },
        summary.pages,
        if summary.pages == 1 { "" } else { "s" },
        duration.as_secs_f64(),
    );
    println!(
        "  {}  {}  {}  {}  {}",
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} unavailable", summary.unavailable)).red(),
        style("|").dim(),
        style(format!("{} no data", summary.undetermined)).yellow(),
    );

    if summary.transport_errors > 0 || summary.store_errors > 0 {
        println!(
            "  {}",
            style(format!(
                "{} transport errors, {} store errors (rows left for the next run)",
                summary.transport_errors, summary.store_errors
            ))
            .yellow()
        );
    }

    if let Some(counts) = counts {
        println!(
            "  store: {} total  {}  {} unknown  {}  {} unavailable  {}  {} available",
            counts.total(),
            style("|").dim(),
            counts.unknown,
            style("|").dim(),
            counts.unavailable,
            style("|").dim(),
            counts.available,
        );
    }
}

pub fn print_dump_summary(scripts: &[ExportedScript], duration: Duration) {
    println!("  {}", style(RULE).dim());
    for script in scripts {
        println!(
            "  {}  {}",
            style(script.path.display()).bold(),
            style(format!("{} statements", script.rows)).green()
        );
    }
    println!("  written in {:.1}s", duration.as_secs_f64());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}
