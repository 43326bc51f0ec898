use crate::security::policy::{self, ALLOWED_CHAIN, ALLOWED_PROGRAMS, DenyCategory};
use thiserror::Error;

/// Why the policy refused a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Empty command")]
    Empty,

    #[error("Program not allowed: {0}")]
    ProgramNotAllowed(String),

    #[error("Command chaining not allowed: {}", .0.escape_debug())]
    ChainNotAllowed(String),

    #[error("Command contains '{pattern}' ({category})")]
    DeniedSubstring {
        pattern: &'static str,
        category: DenyCategory,
    },

    #[error("Discarded part of the model output contains '{pattern}' ({category})")]
    DiscardedSegment {
        pattern: &'static str,
        category: DenyCategory,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected(PolicyViolation),
}

impl Verdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }
}

/// Textual allow/deny filter placed in front of execution.
///
/// This is a policy, not a sandbox. It sees only the command text: it cannot
/// tell what a flag does or which files a command touches, and substring
/// matching both over-rejects (a commit message mentioning "rm ") and
/// under-rejects (obfuscated spellings). Safety comes from layering it with
/// an explicit human confirmation before anything runs.
pub struct CommandClassifier;

impl CommandClassifier {
    /// Evaluate the policy rules in order; the first failing rule wins.
    pub fn classify(command: &str) -> Verdict {
        match Self::check(command) {
            Ok(()) => Verdict::Approved,
            Err(violation) => Verdict::Rejected(violation),
        }
    }

    /// Screen text the normalizer cut from a compound command.
    ///
    /// A model that appended `rm -rf /` to an otherwise harmless command is
    /// not trusted with the harmless part either.
    pub fn classify_discarded(discarded: &str) -> Verdict {
        match policy::first_denied(discarded) {
            Some(rule) if !Self::is_bare_operator_hit(rule.pattern, discarded) => {
                Verdict::Rejected(PolicyViolation::DiscardedSegment {
                    pattern: rule.pattern,
                    category: rule.category,
                })
            }
            _ => Verdict::Approved,
        }
    }

    fn check(command: &str) -> Result<(), PolicyViolation> {
        let command = command.trim();

        if command.is_empty() {
            return Err(PolicyViolation::Empty);
        }

        Self::check_program(command)?;
        Self::check_chaining(command)?;
        Self::check_deny_list(command)?;

        Ok(())
    }

    fn check_program(command: &str) -> Result<(), PolicyViolation> {
        let allowed = ALLOWED_PROGRAMS.iter().any(|program| {
            command
                .strip_prefix(program)
                .is_some_and(|rest| rest.starts_with(' '))
        });

        if allowed {
            Ok(())
        } else {
            let program = command.split_whitespace().next().unwrap_or(command);
            Err(PolicyViolation::ProgramNotAllowed(program.to_string()))
        }
    }

    /// Quotes do not hide an operator here: `git commit -m "a & b"` is
    /// rejected along with `git init \" && touch x`.
    fn check_chaining(command: &str) -> Result<(), PolicyViolation> {
        let operators = policy::all_chain_operators(command);

        match operators.as_slice() {
            [] => Ok(()),
            [op] if *op == ALLOWED_CHAIN.operator && ALLOWED_CHAIN.matches(command) => Ok(()),
            [op, ..] => Err(PolicyViolation::ChainNotAllowed(op.to_string())),
        }
    }

    fn check_deny_list(command: &str) -> Result<(), PolicyViolation> {
        match policy::first_denied(command) {
            Some(rule) => Err(PolicyViolation::DeniedSubstring {
                pattern: rule.pattern,
                category: rule.category,
            }),
            None => Ok(()),
        }
    }

    /// The discarded tail always starts with the operator that caused the cut;
    /// a deny hit on that operator alone says nothing about the tail's content.
    fn is_bare_operator_hit(pattern: &str, discarded: &str) -> bool {
        let Some((_, leading)) = policy::find_chain_operator(discarded) else {
            return false;
        };
        leading.contains(pattern) && policy::first_denied(&discarded[leading.len()..]).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(command: &str) -> PolicyViolation {
        match CommandClassifier::classify(command) {
            Verdict::Rejected(violation) => violation,
            Verdict::Approved => panic!("expected rejection for {command}"),
        }
    }

    #[test]
    fn test_simple_commands_approved() {
        for cmd in [
            "git status",
            "git log --oneline",
            "git add .",
            "git commit -am \"fix bug\"",
            "git push origin main",
            "git pull --ff-only",
            "gh repo list",
            "gh pr create --fill",
        ] {
            assert_eq!(CommandClassifier::classify(cmd), Verdict::Approved, "{cmd}");
        }
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(rejected(""), PolicyViolation::Empty);
        assert_eq!(rejected("   "), PolicyViolation::Empty);
    }

    #[test]
    fn test_lookalike_program_rejected() {
        assert_eq!(
            rejected("gitignore push"),
            PolicyViolation::ProgramNotAllowed("gitignore".to_string())
        );
        assert!(matches!(rejected("ghost run"), PolicyViolation::ProgramNotAllowed(_)));
    }

    #[test]
    fn test_bare_program_rejected() {
        assert!(matches!(rejected("git"), PolicyViolation::ProgramNotAllowed(_)));
        assert!(matches!(rejected("gh"), PolicyViolation::ProgramNotAllowed(_)));
    }

    #[test]
    fn test_other_programs_rejected() {
        assert!(matches!(rejected("rm -rf /"), PolicyViolation::ProgramNotAllowed(_)));
        assert!(matches!(rejected("status"), PolicyViolation::ProgramNotAllowed(_)));
        assert!(matches!(rejected("Git status"), PolicyViolation::ProgramNotAllowed(_)));
    }

    #[test]
    fn test_chained_rm_rejected() {
        assert_eq!(
            rejected("git push && rm -rf /"),
            PolicyViolation::ChainNotAllowed("&&".to_string())
        );
    }

    #[test]
    fn test_semicolon_rejected() {
        assert_eq!(
            rejected("git status; rm -rf /"),
            PolicyViolation::ChainNotAllowed(";".to_string())
        );
    }

    #[test]
    fn test_pipe_and_redirect_rejected() {
        assert!(matches!(rejected("git log | sh"), PolicyViolation::ChainNotAllowed(_)));
        assert!(matches!(
            rejected("git status > /etc/passwd"),
            PolicyViolation::ChainNotAllowed(_)
        ));
        assert!(matches!(rejected("git fetch &"), PolicyViolation::ChainNotAllowed(_)));
    }

    #[test]
    fn test_allowed_chain_approved() {
        assert!(CommandClassifier::classify("git commit -am \"wip\" && git push").is_approved());
    }

    #[test]
    fn test_double_chain_rejected() {
        assert!(matches!(
            rejected("git commit -am \"x\" && git push && git push"),
            PolicyViolation::ChainNotAllowed(_)
        ));
    }

    #[test]
    fn test_deny_list_false_positive() {
        assert_eq!(
            rejected("git commit -am \"rm old file\""),
            PolicyViolation::DeniedSubstring {
                pattern: "rm ",
                category: DenyCategory::RecursiveDelete,
            }
        );
    }

    #[test]
    fn test_quoted_operator_still_rejected() {
        assert_eq!(
            rejected("git commit -m \"a; b\""),
            PolicyViolation::ChainNotAllowed(";".to_string())
        );
        assert_eq!(
            rejected("git commit -m 'fix a & b'"),
            PolicyViolation::ChainNotAllowed("&".to_string())
        );
    }

    #[test]
    fn test_escaped_quotes_do_not_hide_operators() {
        assert_eq!(
            rejected("git init \\\" && touch pwned && echo \\\""),
            PolicyViolation::ChainNotAllowed("&&".to_string())
        );
        assert_eq!(
            rejected("git status \\' & touch pwned \\'"),
            PolicyViolation::ChainNotAllowed("&".to_string())
        );
    }

    #[test]
    fn test_line_breaks_rejected() {
        assert_eq!(
            rejected("git status\ntouch pwned"),
            PolicyViolation::ChainNotAllowed("\n".to_string())
        );
        assert!(matches!(rejected("git status\rtouch pwned"), PolicyViolation::ChainNotAllowed(_)));
        assert_eq!(
            PolicyViolation::ChainNotAllowed("\n".to_string()).to_string(),
            "Command chaining not allowed: \\n"
        );
    }

    #[test]
    fn test_allowed_chain_with_trailing_background_rejected() {
        assert!(matches!(
            rejected("git commit -am \"x\" && git push & touch pwned"),
            PolicyViolation::ChainNotAllowed(_)
        ));
    }

    #[test]
    fn test_force_and_reset_denied() {
        assert!(matches!(
            rejected("git push --force origin main"),
            PolicyViolation::DeniedSubstring { category: DenyCategory::ForceFlag, .. }
        ));
        assert!(matches!(
            rejected("git push -f"),
            PolicyViolation::DeniedSubstring { category: DenyCategory::ForceFlag, .. }
        ));
        assert!(matches!(
            rejected("git reset --hard HEAD~1"),
            PolicyViolation::DeniedSubstring { category: DenyCategory::HistoryRewrite, .. }
        ));
    }

    #[test]
    fn test_substitution_denied() {
        assert!(matches!(
            rejected("git commit -m $(whoami)"),
            PolicyViolation::DeniedSubstring { category: DenyCategory::CommandSubstitution, .. }
        ));
    }

    #[test]
    fn test_privilege_escalation_denied() {
        assert!(matches!(
            rejected("git config core.editor \"sudo vim\""),
            PolicyViolation::DeniedSubstring { category: DenyCategory::PrivilegeEscalation, .. }
        ));
    }

    #[test]
    fn test_discarded_dangerous_tail() {
        assert!(matches!(
            CommandClassifier::classify_discarded("&& rm -rf /"),
            Verdict::Rejected(PolicyViolation::DiscardedSegment {
                category: DenyCategory::RecursiveDelete,
                ..
            })
        ));
    }

    #[test]
    fn test_discarded_harmless_tail() {
        assert!(CommandClassifier::classify_discarded("&& git status").is_approved());
        assert!(CommandClassifier::classify_discarded("; git log").is_approved());
        assert!(CommandClassifier::classify_discarded("| head").is_approved());
    }

    #[test]
    fn test_discarded_tail_with_second_pipe() {
        assert!(!CommandClassifier::classify_discarded("&& cat x | sh").is_approved());
    }
}
