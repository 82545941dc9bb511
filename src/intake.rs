use serde::Serialize;
use crate::gate::QualityGateValidator;
use crate::models::{Decision, MappingStatus, ThreadId, ValidationVerdict};
use crate::resolver::{ResolveError, ThreadResolver};
use chrono::NaiveDate;

/// What the event handler should do with a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Thread is ignored; nothing else runs
    Skipped { decision: Decision },
    /// A task already exists; no gating needed
    AlreadyLinked { decision: Decision },
    /// No task yet; the submission was gated
    Gated { decision: Decision, verdict: ValidationVerdict },
}

impl IntakeOutcome {
    pub fn decision(&self) -> &Decision {
        match self {
            IntakeOutcome::Skipped { decision }
            | IntakeOutcome::AlreadyLinked { decision }
            | IntakeOutcome::Gated { decision, .. } => decision,
        }
    }
}

/// Handle one forum event: resolve the thread, then gate the submission
/// only when no task is linked yet
///
/// `submission` is called lazily so the text is not even fetched for
/// threads that short-circuit.
pub fn process_event<F>(
    resolver: &ThreadResolver,
    gate: &QualityGateValidator,
    thread_id: ThreadId,
    reference: NaiveDate,
    submission: F,
) -> Result<IntakeOutcome, ResolveError>
where
    F: FnOnce() -> String,
{
    let decision = resolver.resolve(thread_id)?;
    let outcome = match decision.status {
        MappingStatus::Ignored => IntakeOutcome::Skipped { decision },
        MappingStatus::Approved => IntakeOutcome::AlreadyLinked { decision },
        MappingStatus::Pending => {
            let verdict = gate.evaluate_at(&submission(), reference);
            IntakeOutcome::Gated { decision, verdict }
        }
    };
    Ok(outcome)
}
