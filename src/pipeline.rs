//! Per-request flow: infer, normalize, classify, confirm, execute, and offer
//! the push that follows a successful commit.
//!
//! ```text
//! Idle → Inferred → Normalized → Classified ─ Rejected ─→ report
//!                                   │
//!                                Approved → AwaitingConfirmation ─ Declined ─→ done
//!                                                 │
//!                                             Confirmed → Executed ─ Failure ─→ report
//!                                                            │
//!                                          Success & commit → OfferFollowUp → Classified
//! ```

use crate::audit::AuditLogger;
use crate::error::{PipelineError, PipelineResult};
use crate::exec::{ExecutionCoordinator, ExecutionOutcome, WorkContext};
use crate::llm::Translator;
use crate::security::{
    CanonicalCommand, CommandClassifier, CommandNormalizer, PolicyViolation, Verdict,
};

/// The human side of the confirmation gate
pub trait Operator {
    /// Ask whether `command` may run. `follow_up` is true for the push offered
    /// after a commit. Returning false declines; it is not an error.
    fn confirm(&mut self, command: &CanonicalCommand, follow_up: bool) -> bool;

    /// Observe a command that ran, before any follow-up is offered
    fn executed(&mut self, _outcome: &ExecutionOutcome) {}
}

/// What happened to a request that did not end in an error
#[derive(Debug, Clone)]
pub struct RequestSummary {
    /// The command proposed for the request
    pub proposed: CanonicalCommand,
    /// Every command that ran, in order
    pub executions: Vec<ExecutionOutcome>,
    /// The command the operator turned down, if any
    pub declined: Option<CanonicalCommand>,
    /// A follow-up the classifier refused. The command before it still ran.
    pub follow_up_rejected: Option<(CanonicalCommand, PolicyViolation)>,
}

pub struct Pipeline {
    translator: Translator,
    coordinator: ExecutionCoordinator,
    audit: Option<AuditLogger>,
    offer_follow_up: bool,
}

impl Pipeline {
    pub fn new(translator: Translator, coordinator: ExecutionCoordinator) -> Self {
        Self {
            translator,
            coordinator,
            audit: None,
            offer_follow_up: true,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_follow_up(mut self, enabled: bool) -> Self {
        self.offer_follow_up = enabled;
        self
    }

    /// Process one request to completion. Nothing runs without `operator`
    /// confirming it first.
    pub async fn handle(
        &self,
        request: &str,
        ctx: &WorkContext,
        operator: &mut dyn Operator,
    ) -> PipelineResult<RequestSummary> {
        let raw = self.translator.translate(request, ctx).await?;

        let proposed = Self::screen(&raw).inspect_err(|e| {
            if let PipelineError::RejectedBySafetyPolicy { violation, .. } = e {
                self.audit_rejection(request, &raw, violation, ctx);
            }
        })?;
        tracing::info!(command = %proposed, "command approved");

        let mut summary = RequestSummary {
            proposed: proposed.clone(),
            executions: Vec::new(),
            declined: None,
            follow_up_rejected: None,
        };

        let mut pending = Some((proposed, false));
        while let Some((command, follow_up)) = pending.take() {
            if !operator.confirm(&command, follow_up) {
                tracing::debug!(command = %command, "declined");
                summary.declined = Some(command);
                break;
            }

            let outcome = self.coordinator.execute(&command, ctx);
            self.audit_execution(&outcome, ctx);
            operator.executed(&outcome);

            if !outcome.success {
                return Err(PipelineError::ExecutionFailure {
                    command: command.into_string(),
                    exit_code: outcome.exit_code,
                    stderr: outcome.stderr,
                });
            }

            let next = if self.offer_follow_up {
                self.coordinator.follow_up(&outcome, ctx)
            } else {
                None
            };
            summary.executions.push(outcome);

            // The follow-up goes back through the classifier like any other command.
            let Some(next) = next else { break };
            match CommandClassifier::classify(next.as_str()) {
                Verdict::Approved => pending = Some((next, true)),
                Verdict::Rejected(violation) => {
                    tracing::warn!(command = %next, %violation, "follow-up rejected");
                    self.audit_rejection(request, next.as_str(), &violation, ctx);
                    summary.follow_up_rejected = Some((next, violation));
                }
            }
        }

        Ok(summary)
    }

    /// Normalize raw model output and run it through the classifier.
    pub fn screen(raw: &str) -> PipelineResult<CanonicalCommand> {
        let normalized = CommandNormalizer::normalize_detailed(raw);
        tracing::debug!(
            command = %normalized.command,
            discarded = ?normalized.discarded,
            "normalized"
        );

        if normalized.command.is_empty() {
            return Err(PipelineError::EmptyOrUnparseableOutput {
                raw: raw.to_string(),
            });
        }

        if let Some(discarded) = &normalized.discarded {
            if let Verdict::Rejected(violation) = CommandClassifier::classify_discarded(discarded) {
                return Err(PipelineError::RejectedBySafetyPolicy {
                    command: format!("{} {}", normalized.command, discarded),
                    violation,
                });
            }
        }

        Self::check(normalized.command)
    }

    fn check(command: CanonicalCommand) -> PipelineResult<CanonicalCommand> {
        match CommandClassifier::classify(command.as_str()) {
            Verdict::Approved => Ok(command),
            Verdict::Rejected(violation) => {
                tracing::warn!(command = %command, %violation, "command rejected");
                Err(PipelineError::RejectedBySafetyPolicy {
                    command: command.into_string(),
                    violation,
                })
            }
        }
    }

    fn audit_execution(&self, outcome: &ExecutionOutcome, ctx: &WorkContext) {
        if let Some(audit) = &self.audit {
            if let Err(e) =
                audit.log_execution(outcome.command.as_str(), ctx.working_dir(), outcome.exit_code)
            {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }

    fn audit_rejection(
        &self,
        request: &str,
        rejected: &str,
        violation: &PolicyViolation,
        ctx: &WorkContext,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };

        let reason = violation.to_string();
        if let Err(e) = audit.log_rejection(request, rejected, &reason, ctx.working_dir()) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
    }
}
