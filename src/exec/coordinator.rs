use crate::exec::branch::{BranchResolver, GitBranchResolver, WorkContext};
use crate::exec::runner::{CommandOutput, CommandRunner, ShellRunner};
use crate::security::CanonicalCommand;
use crate::security::policy::{self, ALLOWED_CHAIN};

/// Result of running an approved command
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub command: CanonicalCommand,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// The command recorded a commit and may be followed by a push
    pub commit_class: bool,
}

/// Runs approved commands and decides what follow-up, if any, to offer.
///
/// The coordinator never asks for confirmation itself and never runs the
/// follow-up it proposes.
pub struct ExecutionCoordinator {
    runner: Box<dyn CommandRunner>,
    resolver: Box<dyn BranchResolver>,
    remote: String,
    fallback_branch: String,
}

impl ExecutionCoordinator {
    pub fn new(remote: impl Into<String>, fallback_branch: impl Into<String>) -> Self {
        Self::with_components(
            Box::new(ShellRunner),
            Box::new(GitBranchResolver),
            remote,
            fallback_branch,
        )
    }

    pub fn with_components(
        runner: Box<dyn CommandRunner>,
        resolver: Box<dyn BranchResolver>,
        remote: impl Into<String>,
        fallback_branch: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            resolver,
            remote: remote.into(),
            fallback_branch: fallback_branch.into(),
        }
    }

    /// Run `command` in the context's directory. Failures are part of the
    /// outcome; this never errors.
    pub fn execute(&self, command: &CanonicalCommand, ctx: &WorkContext) -> ExecutionOutcome {
        tracing::info!(command = %command, dir = %ctx.working_dir().display(), "executing");

        let CommandOutput {
            stdout,
            stderr,
            exit_code,
            success,
        } = self.runner.run(command.as_str(), ctx.working_dir());

        if !success {
            tracing::warn!(command = %command, ?exit_code, "command failed");
        }

        ExecutionOutcome {
            commit_class: Self::is_commit_class(command.as_str()),
            command: command.clone(),
            success,
            exit_code,
            stdout,
            stderr,
        }
    }

    /// The push to offer after a successful commit, if any.
    pub fn follow_up(
        &self,
        outcome: &ExecutionOutcome,
        ctx: &WorkContext,
    ) -> Option<CanonicalCommand> {
        if !outcome.success || !outcome.commit_class {
            return None;
        }

        let branch = ctx.branch(self.resolver.as_ref(), &self.fallback_branch);
        Some(CanonicalCommand::from_trusted(format!(
            "git push {} {}",
            self.remote, branch
        )))
    }

    /// A commit that is not already chained to a push.
    pub fn is_commit_class(command: &str) -> bool {
        policy::is_invocation_of(command, ALLOWED_CHAIN.first)
            && !command.contains(ALLOWED_CHAIN.operator)
    }
}
