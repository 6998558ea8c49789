use colored::Colorize;
use reconcile::{ApplySummary, DiffSummary};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Reports
// ============================================================================

/// Color one report line by its change marker
pub fn report_line(line: &str) -> String {
    let marker = line.trim_start().chars().next();
    match marker {
        Some('+') => line.green().to_string(),
        Some('-') => line.red().to_string(),
        Some('~') => line.yellow().to_string(),
        Some('*') => line.cyan().to_string(),
        _ => line.to_string(),
    }
}

/// Print a rendered diff report
pub fn print_report(report: &str) {
    for line in report.lines() {
        println!("  {}", report_line(line));
    }
}

/// One-line description of a diff summary
pub fn diff_summary_line(summary: &DiffSummary) -> String {
    let mut parts = Vec::new();
    if summary.created > 0 {
        parts.push(format!("{} added", summary.created));
    }
    if summary.updated > 0 {
        parts.push(format!("{} changed", summary.updated));
    }
    if summary.deleted > 0 {
        parts.push(format!("{} removed", summary.deleted));
    }
    let blobs = summary.blobs();
    if blobs > 0 {
        parts.push(format!("{blobs} blob{}", if blobs == 1 { "" } else { "s" }));
    }
    if parts.is_empty() {
        "no changes".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn print_diff_summary(summary: &DiffSummary) {
    println!();
    println!(
        "{} {}",
        "Summary:".bold(),
        diff_summary_line(summary).dimmed()
    );
}

pub fn print_apply_summary(summary: &ApplySummary) {
    if summary.handlers_cleared {
        kv("handlers", "cleared and restored");
    }
    if summary.elements_deleted > 0 || summary.elements_created > 0 {
        kv(
            "elements",
            &format!(
                "{} deleted, {} created",
                summary.elements_deleted, summary.elements_created
            ),
        );
    }
    if summary.blobs_written > 0 {
        kv("blobs written", &summary.blobs_written.to_string());
    }
    if summary.blobs_removed > 0 {
        kv("blobs removed", &summary.blobs_removed.to_string());
    }
    if summary.fields_updated > 0 {
        kv("fields", &summary.fields_updated.to_string());
    }
    if summary.definition_saved {
        kv("definition", "saved");
    }
}

// ============================================================================
// Tests
// ============================================================================
