use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Required piece of information in an intake submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Notion,
    Context,
    Scope,
    Deadline,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [Pillar::Notion, Pillar::Context, Pillar::Scope, Pillar::Deadline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Notion => "notion",
            Pillar::Context => "context",
            Pillar::Scope => "scope",
            Pillar::Deadline => "deadline",
        }
    }

    /// Label used in feedback summaries
    pub fn label(&self) -> &'static str {
        match self {
            Pillar::Notion => "Notion link",
            Pillar::Context => "context",
            Pillar::Scope => "scope",
            Pillar::Deadline => "deadline",
        }
    }
}

/// Result of running the quality gate over one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub missing_pillars: BTreeSet<Pillar>,
    pub feedback: String,
    /// First absolute deadline found, normalized against the reference date
    pub deadline: Option<NaiveDate>,
}

impl ValidationVerdict {
    pub fn from_missing(missing_pillars: BTreeSet<Pillar>, deadline: Option<NaiveDate>) -> Self {
        let feedback = summarize(&missing_pillars);
        Self {
            is_valid: missing_pillars.is_empty(),
            missing_pillars,
            feedback,
            deadline,
        }
    }

    pub fn is_missing(&self, pillar: Pillar) -> bool {
        self.missing_pillars.contains(&pillar)
    }
}

fn summarize(missing: &BTreeSet<Pillar>) -> String {
    if missing.is_empty() {
        return "All pillars present: Notion link, context, scope, deadline.".to_string();
    }
    let labels: Vec<&str> = missing.iter().map(|p| p.label()).collect();
    format!("Missing {} of 4 pillars: {}.", missing.len(), labels.join(", "))
}
