use crate::exec::WorkContext;
use crate::security::policy::ALLOWED_PROGRAMS;

/// Builds the instruction prompt sent to the model
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(request: &str, ctx: &WorkContext) -> String {
        let programs = ALLOWED_PROGRAMS.join(" or ");
        let directory = ctx
            .working_dir()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ctx.working_dir().display().to_string());

        format!(
            "You are a helpful Git assistant. Convert the user's request into a single safe {programs} command.

Working directory: {directory}

CRITICAL INSTRUCTIONS:
- Respond with ONLY the command itself
- The command must start with {programs}
- Do NOT include explanations, reasoning, or commentary
- Do NOT use markdown code blocks or backticks
- Do NOT chain commands with &&, ;, or |, except `git commit ... && git push`
- Never use --force, reset --hard, or anything that deletes files
- Output format: exactly one line
- Example good response: git status
- Example bad response: ```bash\\ngit status\\n```

User request: {request}

Your response:"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_request_and_directory() {
        let ctx = WorkContext::new("/home/me/projects/widget");
        let prompt = PromptBuilder::build("commit my changes", &ctx);

        assert!(prompt.contains("User request: commit my changes"));
        assert!(prompt.contains("Working directory: widget"));
        assert!(prompt.contains("git or gh"));
    }

    #[test]
    fn test_prompt_does_not_resolve_branch() {
        let ctx = WorkContext::new("/tmp");
        let _ = PromptBuilder::build("status", &ctx);
        assert!(!ctx.branch_resolved());
    }
}
