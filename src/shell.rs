use crate::error::PipelineError;
use crate::error_translation::ErrorTranslator;
use crate::exec::{ExecutionOutcome, WorkContext};
use crate::pipeline::{Operator, Pipeline};
use crate::security::CanonicalCommand;
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// `y` or `yes`, ignoring case and surrounding whitespace. Anything else,
/// including an empty line, declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn is_exit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit")
}

/// Line-oriented read loop around a [`Pipeline`]
pub struct Shell<R, W> {
    pipeline: Pipeline,
    working_dir: PathBuf,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(pipeline: Pipeline, working_dir: PathBuf, input: R, output: W) -> Self {
        Self {
            pipeline,
            working_dir,
            input,
            output,
        }
    }

    /// Serve requests until `exit`, `quit` or end of input. Pipeline errors are
    /// reported and never end the loop.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", "gitpilot: natural language git assistant".bold())?;
        writeln!(self.output, "Type 'exit' to quit.\n")?;

        loop {
            write!(self.output, "{} ", "You:".bold())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            if is_exit(request) {
                break;
            }

            // A fresh context per request: the branch is re-resolved each time.
            let ctx = WorkContext::new(&self.working_dir);
            let mut console = Console {
                input: &mut self.input,
                output: &mut self.output,
            };

            let result = self.pipeline.handle(request, &ctx, &mut console).await;
            match result {
                Ok(summary) => {
                    if let Some((command, violation)) = summary.follow_up_rejected {
                        writeln!(self.output, "Commit recorded, but the push was not offered.")?;
                        self.report(&PipelineError::RejectedBySafetyPolicy {
                            command: command.into_string(),
                            violation,
                        })?;
                    }
                    if summary.declined.is_some() {
                        writeln!(self.output, "Skipped.")?;
                    }
                }
                Err(e) => self.report(&e)?,
            }
        }

        Ok(())
    }

    fn report(&mut self, error: &PipelineError) -> io::Result<()> {
        let friendly = ErrorTranslator::translate(error);
        writeln!(self.output, "{} {}", "✗".red(), friendly.simple_message)?;
        if let Some(suggestion) = friendly.suggestion {
            writeln!(self.output, "  {}", suggestion.dark_grey())?;
        }
        tracing::debug!(error = %friendly.raw_error, "request failed");
        Ok(())
    }
}

/// Terminal side of the confirmation gate
struct Console<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Console<'_, R, W> {
    fn ask(&mut self, command: &CanonicalCommand, follow_up: bool) -> io::Result<bool> {
        if follow_up {
            writeln!(self.output, "{} {}", "Commit recorded. Push with:".green(), command)?;
        } else {
            writeln!(self.output, "{} {}", "AI →".cyan().bold(), command)?;
        }
        write!(self.output, "Run this command? (y/n): ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

impl<R: BufRead, W: Write> Operator for Console<'_, R, W> {
    fn confirm(&mut self, command: &CanonicalCommand, follow_up: bool) -> bool {
        // An unreadable answer is a decline.
        self.ask(command, follow_up).unwrap_or(false)
    }

    fn executed(&mut self, outcome: &ExecutionOutcome) {
        if !outcome.stdout.is_empty() {
            let _ = write!(self.output, "{}", outcome.stdout);
        }
        if !outcome.stderr.is_empty() {
            let _ = write!(self.output, "{}", outcome.stderr.as_str().dark_grey());
        }
        let _ = self.output.flush();
    }
}
