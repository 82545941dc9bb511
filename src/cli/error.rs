// Error handling utilities for consistent error messages and exit codes

use std::process;
use chrono::NaiveDate;
use crate::models::{MappingStatus, ThreadId};

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a thread ID is a decimal number
pub fn validate_thread_id(id_str: &str) -> Result<ThreadId, String> {
    let trimmed = id_str.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid thread ID: '{}'. Thread ID must be a number.", id_str));
    }
    trimmed
        .parse::<ThreadId>()
        .map_err(|_| format!("Invalid thread ID: '{}'. Thread ID is out of range.", id_str))
}

/// Validate a mapping status name
pub fn validate_status(status: &str) -> Result<MappingStatus, String> {
    MappingStatus::from_str(status).ok_or_else(|| {
        format!("Invalid status: '{}'. Status must be approved, pending or ignored.", status)
    })
}

/// Validate a reference date in YYYY-MM-DD form
pub fn validate_reference_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: '{}'. Use YYYY-MM-DD.", date))
}
