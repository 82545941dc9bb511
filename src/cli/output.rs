// Human-readable output formatting

use crate::intake::IntakeOutcome;
use crate::models::{Decision, MappingRecord, Pillar, ProcessedRecord, ValidationVerdict};
use crate::populate::RebuildSummary;

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Truncate to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    if max <= 1 {
        return "…".chars().take(max).collect();
    }
    let mut out: String = single_line.chars().take(max - 1).collect();
    out.push('…');
    out
}

pub fn format_decision(decision: &Decision) -> String {
    let mut out = format!("Thread {}: {}", decision.thread_id, decision.status.as_str());
    if let Some(url) = &decision.task_url {
        out.push_str(&format!("\n  Task:   {}", url));
    }
    match decision.source {
        Some(source) => out.push_str(&format!("\n  Source: {}", source.as_str())),
        None => out.push_str("\n  Source: none (run the quality gate)"),
    }
    out
}

pub fn format_verdict(verdict: &ValidationVerdict) -> String {
    let mut out = String::new();
    out.push_str(if verdict.is_valid { "PASS" } else { "FAIL" });
    out.push_str(&format!(": {}\n", verdict.feedback));
    for pillar in Pillar::ALL {
        let mark = if verdict.is_missing(pillar) { "missing" } else { "ok" };
        out.push_str(&format!("  {:<10} {}\n", pillar.as_str(), mark));
    }
    if let Some(deadline) = verdict.deadline {
        out.push_str(&format!("  Deadline date: {}\n", deadline.format("%Y-%m-%d")));
    }
    out.trim_end().to_string()
}

pub fn format_outcome(outcome: &IntakeOutcome) -> String {
    match outcome {
        IntakeOutcome::Skipped { decision } => {
            format!("Thread {} is ignored; skipping.", decision.thread_id)
        }
        IntakeOutcome::AlreadyLinked { decision } => {
            format!("Already linked.\n{}", format_decision(decision))
        }
        IntakeOutcome::Gated { decision, verdict } => {
            format!("{}\n{}", format_decision(decision), format_verdict(verdict))
        }
    }
}

pub fn format_summary(summary: &RebuildSummary) -> String {
    format!(
        "Rebuilt mapping table: {} threads\n  Approved (with task link): {}\n  Pending (no link):         {}",
        summary.total, summary.approved_count, summary.pending_count
    )
}

/// Mapping rows as a fixed-width table fitted to the terminal
pub fn format_mapping_table(records: &[&MappingRecord], width: usize) -> String {
    if records.is_empty() {
        return "No mapping rows found.".to_string();
    }

    // id (20) + status (9) + separators; the rest is shared by title and url
    let flexible = width.saturating_sub(20 + 1 + 9 + 1 + 1).max(30);
    let title_width = (flexible * 2 / 5).max(10);
    let url_width = flexible.saturating_sub(title_width).max(10);

    let mut out = format!(
        "{:<20} {:<9} {:<title_width$} {}\n",
        "Thread", "Status", "Title", "Task URL",
        title_width = title_width
    );
    out.push_str(&"-".repeat(20 + 1 + 9 + 1 + title_width + 1 + url_width.min(40)));
    out.push('\n');
    for record in records {
        let status = match &record.unparsed_status {
            Some(raw) => format!("?{}", raw),
            None => record.status.as_str().to_string(),
        };
        out.push_str(&format!(
            "{:<20} {:<9} {:<title_width$} {}\n",
            record.thread_id,
            truncate(&status, 9),
            truncate(&record.thread_title, title_width),
            truncate(record.task_url.as_deref().unwrap_or("-"), url_width),
            title_width = title_width
        ));
    }
    out.trim_end().to_string()
}

pub fn format_processed_list(records: &[ProcessedRecord]) -> String {
    if records.is_empty() {
        return "No processed threads.".to_string();
    }
    let mut out = format!("{:<20} {:<16} {:<20} {}\n", "Thread", "Source", "Decided", "Task URL");
    out.push_str(&"-".repeat(80));
    out.push('\n');
    for record in records {
        let decided = chrono::DateTime::from_timestamp(record.decided_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| record.decided_at.to_string());
        out.push_str(&format!(
            "{:<20} {:<16} {:<20} {}\n",
            record.thread_id,
            record.source.as_str(),
            decided,
            record.resolved_task_url.as_deref().unwrap_or("(ignored)")
        ));
    }
    out.trim_end().to_string()
}
