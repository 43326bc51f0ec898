use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Read-only lookup of the branch checked out in a directory
pub trait BranchResolver: Send + Sync {
    /// `None` on any failure: not a repository, detached HEAD, git missing.
    fn current_branch(&self, working_dir: &Path) -> Option<String>;
}

/// Asks git via `git branch --show-current`
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBranchResolver;

impl BranchResolver for GitBranchResolver {
    fn current_branch(&self, working_dir: &Path) -> Option<String> {
        let output = Command::new("git")
            .args(["branch", "--show-current"])
            .current_dir(working_dir)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        // Empty output means detached HEAD
        (!branch.is_empty()).then_some(branch)
    }
}

/// The directory a request runs in, passed explicitly through the pipeline.
///
/// The branch is only looked up when something needs it and is then cached
/// for the lifetime of the context.
#[derive(Debug)]
pub struct WorkContext {
    working_dir: PathBuf,
    branch: OnceCell<String>,
}

impl WorkContext {
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            branch: OnceCell::new(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Current branch, resolved on first use. Resolution failures fall back
    /// to `fallback` silently.
    pub fn branch(&self, resolver: &dyn BranchResolver, fallback: &str) -> &str {
        self.branch.get_or_init(|| match resolver.current_branch(&self.working_dir) {
            Some(branch) => branch,
            None => {
                tracing::debug!(
                    dir = %self.working_dir.display(),
                    fallback,
                    "branch lookup failed, using fallback"
                );
                fallback.to_string()
            }
        })
    }

    /// Whether the branch has been resolved yet
    pub fn branch_resolved(&self) -> bool {
        self.branch.get().is_some()
    }
}
