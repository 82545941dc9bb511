//! Intake quality gate.
//!
//! A submission passes when it carries all four pillars: a task-store link,
//! context, scope and a deadline. Every pillar is checked on every call so
//! one reply can point out all the gaps at once. Link, scope and deadline
//! are deterministic pattern checks; context goes through a pluggable
//! [`ContextClassifier`].

pub mod context;
pub mod deadline;
pub mod scope;

pub use context::{ContextClassifier, DelegatedContext, HeuristicContext};
pub use deadline::{scan_deadline, DeadlineScan};
pub use scope::has_scope;

use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use crate::lookup::links::contains_task_url;
use crate::models::{Pillar, ValidationVerdict};

pub struct QualityGateValidator {
    context: Box<dyn ContextClassifier>,
}

impl QualityGateValidator {
    pub fn new(context: Box<dyn ContextClassifier>) -> Self {
        Self { context }
    }

    /// Gate with the default context heuristic
    pub fn with_min_words(min_words: usize) -> Self {
        Self::new(Box::new(HeuristicContext::new(min_words)))
    }

    /// Evaluate against today's date
    pub fn evaluate(&self, text: &str) -> ValidationVerdict {
        self.evaluate_at(text, Local::now().date_naive())
    }

    /// Evaluate with deadlines normalized against `reference`
    ///
    /// Empty or whitespace-only text fails every pillar.
    pub fn evaluate_at(&self, text: &str, reference: NaiveDate) -> ValidationVerdict {
        if text.trim().is_empty() {
            return ValidationVerdict::from_missing(Pillar::ALL.into_iter().collect(), None);
        }

        let deadline = scan_deadline(text, reference);
        let mut missing = BTreeSet::new();
        if !contains_task_url(text) {
            missing.insert(Pillar::Notion);
        }
        if !self.context.has_context(text) {
            missing.insert(Pillar::Context);
        }
        if !has_scope(text) {
            missing.insert(Pillar::Scope);
        }
        if !deadline.found {
            missing.insert(Pillar::Deadline);
        }

        log::debug!(
            "Quality gate: {} of 4 pillars missing ({} chars)",
            missing.len(),
            text.chars().count()
        );
        ValidationVerdict::from_missing(missing, deadline.date)
    }
}

impl Default for QualityGateValidator {
    fn default() -> Self {
        Self::new(Box::new(HeuristicContext::default()))
    }
}
