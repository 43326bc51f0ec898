#![allow(dead_code)]

use async_trait::async_trait;
use gitpilot::llm::{InferenceClient, LLMError};
use gitpilot::{CanonicalCommand, ExecutionOutcome, Operator};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Bare repository registered as `origin` of `repo_path`
pub fn add_bare_remote(repo_path: &Path) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let bare_path = temp_dir.path().to_path_buf();

    git(&bare_path, &["init", "--bare"]);
    git(
        repo_path,
        &["remote", "add", "origin", bare_path.to_str().unwrap()],
    );

    (temp_dir, bare_path)
}

/// One-line log of `rev` in the repository at `repo_path`
pub fn log_oneline(repo_path: &Path, rev: &str) -> String {
    git(repo_path, &["log", "--oneline", rev])
}

pub fn git_output(repo_path: &Path, args: &[&str]) -> String {
    git(repo_path, args)
}

/// Inference client that always answers with the same text or error
pub struct ScriptedClient {
    response: Result<String, String>,
}

impl ScriptedClient {
    pub fn answering(response: &str) -> Box<Self> {
        Box::new(Self {
            response: Ok(response.to_string()),
        })
    }

    pub fn failing(message: &str) -> Box<Self> {
        Box::new(Self {
            response: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn infer(&self, _prompt: &str) -> Result<String, LLMError> {
        self.response
            .clone()
            .map_err(LLMError::ApiError)
    }
}

/// Operator that answers confirmations from a queue and records everything.
/// An exhausted queue declines.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: VecDeque<bool>,
    pub asked: Vec<(String, bool)>,
    pub executed: Vec<ExecutionOutcome>,
}

impl ScriptedOperator {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn asked_commands(&self) -> Vec<&str> {
        self.asked.iter().map(|(command, _)| command.as_str()).collect()
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&mut self, command: &CanonicalCommand, follow_up: bool) -> bool {
        self.asked.push((command.to_string(), follow_up));
        self.answers.pop_front().unwrap_or(false)
    }

    fn executed(&mut self, outcome: &ExecutionOutcome) {
        self.executed.push(outcome.clone());
    }
}
