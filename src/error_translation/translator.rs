use crate::error::{AppError, PipelineError};
use crate::llm::LLMError;
use crate::security::PolicyViolation;

#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub simple_message: String,
    pub suggestion: Option<String>,
    pub raw_error: String,
}

/// A recognisable fragment of command stderr and what to tell the user
struct StderrHint {
    needles: &'static [&'static str],
    message: &'static str,
    suggestion: Option<&'static str>,
}

/// Checked in order; every needle of an entry must appear (case-insensitive).
const STDERR_HINTS: &[StderrHint] = &[
    StderrHint {
        needles: &["has no upstream branch"],
        message: "No remote branch is configured for tracking.",
        suggestion: Some("Try: git push -u origin <branch-name>"),
    },
    StderrHint {
        needles: &["src refspec", "does not match any"],
        message: "The branch to push does not exist locally.",
        suggestion: Some("Check the branch name with: git branch"),
    },
    StderrHint {
        needles: &["nothing to commit"],
        message: "No changes to commit - working directory is clean.",
        suggestion: None,
    },
    StderrHint {
        needles: &["no changes added to commit"],
        message: "No files staged for commit.",
        suggestion: Some("Stage files with: git add <file>"),
    },
    StderrHint {
        needles: &["not a git repository"],
        message: "Current directory is not a git repository.",
        suggestion: Some("Change into a repository or initialize one with: git init"),
    },
    StderrHint {
        needles: &["pathspec", "did not match"],
        message: "File path not found in the repository.",
        suggestion: Some("Use 'git status' to see available files."),
    },
    StderrHint {
        needles: &["conflict"],
        message: "Merge has conflicts that need to be resolved.",
        suggestion: Some("Fix conflicts in the listed files, then git add and git commit."),
    },
    StderrHint {
        needles: &["non-fast-forward"],
        message: "Local and remote branches have diverged.",
        suggestion: Some("Pull changes first: git pull"),
    },
    StderrHint {
        needles: &["rejected", "behind"],
        message: "Local and remote branches have diverged.",
        suggestion: Some("Pull changes first: git pull"),
    },
    StderrHint {
        needles: &["authentication failed"],
        message: "Authentication failed - check your credentials.",
        suggestion: Some("Verify your SSH keys or personal access token."),
    },
    StderrHint {
        needles: &["permission denied"],
        message: "Authentication failed - check your credentials.",
        suggestion: Some("Verify your SSH keys or personal access token."),
    },
    StderrHint {
        needles: &["gh auth login"],
        message: "The GitHub CLI is not logged in.",
        suggestion: Some("Log in with: gh auth login"),
    },
    StderrHint {
        needles: &["command not found"],
        message: "The program is not installed or not on PATH.",
        suggestion: Some("Install git or the GitHub CLI (gh) and try again."),
    },
    StderrHint {
        needles: &["would be overwritten"],
        message: "Operation would overwrite uncommitted changes.",
        suggestion: Some("Commit or stash your changes first: git stash"),
    },
];

pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Translate an AppError into a user-friendly error message
    pub fn translate_app_error(error: &AppError) -> UserFriendlyError {
        match error {
            AppError::Pipeline(pipeline_err) => Self::translate(pipeline_err),
            AppError::Llm(llm_err) => Self::translate_llm(llm_err),
            AppError::Config(config_err) => UserFriendlyError {
                simple_message: "Configuration error occurred.".to_string(),
                suggestion: Some(
                    "Check your config file at ~/.config/gitpilot/config.toml".to_string(),
                ),
                raw_error: config_err.to_string(),
            },
            AppError::Io(io_err) => UserFriendlyError {
                simple_message: "I/O error occurred.".to_string(),
                suggestion: Some("Check file permissions and disk space".to_string()),
                raw_error: io_err.to_string(),
            },
        }
    }

    /// Translate a PipelineError into a user-friendly error message
    pub fn translate(error: &PipelineError) -> UserFriendlyError {
        let raw_error = error.to_string();

        match error {
            PipelineError::InferenceUnavailable(llm_err) => Self::translate_llm(llm_err),
            PipelineError::EmptyOrUnparseableOutput { .. } => UserFriendlyError {
                simple_message: "The model did not return a usable command.".to_string(),
                suggestion: Some("Try rephrasing your request".to_string()),
                raw_error,
            },
            PipelineError::RejectedBySafetyPolicy { command, violation } => {
                let suggestion = match Self::violation_hint(violation) {
                    Some(hint) => format!("{violation}. {hint}"),
                    None => violation.to_string(),
                };
                UserFriendlyError {
                    simple_message: format!("Unsafe command blocked: {}", Self::one_line(command)),
                    suggestion: Some(suggestion),
                    raw_error,
                }
            }
            PipelineError::ExecutionFailure { stderr, .. } => {
                let (simple_message, suggestion) = Self::match_stderr(stderr);
                UserFriendlyError {
                    simple_message,
                    suggestion,
                    raw_error,
                }
            }
        }
    }

    fn translate_llm(error: &LLMError) -> UserFriendlyError {
        let suggestion = match error {
            LLMError::Timeout => "The model took too long; try again or raise llm.timeout_seconds",
            LLMError::ApiError(_) => "Check that the model is pulled: ollama pull <model>",
            _ => "Is Ollama running? Start it with: ollama serve",
        };

        UserFriendlyError {
            simple_message: "No response from the language model.".to_string(),
            suggestion: Some(suggestion.to_string()),
            raw_error: error.to_string(),
        }
    }

    fn violation_hint(violation: &PolicyViolation) -> Option<&'static str> {
        match violation {
            PolicyViolation::Empty => None,
            PolicyViolation::ProgramNotAllowed(_) => Some("Only git and gh commands can be run."),
            PolicyViolation::ChainNotAllowed(_) => Some("Ask for one command at a time."),
            PolicyViolation::DeniedSubstring { .. } | PolicyViolation::DiscardedSegment { .. } => {
                Some("Run it yourself if you are sure it is safe.")
            }
        }
    }

    /// Keep a rejected command on one terminal line
    fn one_line(command: &str) -> String {
        command.replace('\n', "\\n").replace('\r', "\\r")
    }

    /// Match command stderr against known git and gh failures
    fn match_stderr(stderr: &str) -> (String, Option<String>) {
        let lower = stderr.to_lowercase();

        STDERR_HINTS
            .iter()
            .find(|hint| hint.needles.iter().all(|needle| lower.contains(needle)))
            .map(|hint| {
                (
                    hint.message.to_string(),
                    hint.suggestion.map(str::to_string),
                )
            })
            .unwrap_or_else(|| ("Command failed.".to_string(), None))
    }
}
