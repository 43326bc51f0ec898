use crate::security::policy::{
    self, ALLOWED_CHAIN, DASH_VARIANTS, LABEL_PREFIXES, MARKDOWN_LEADERS, REWRITE_RULES,
    RewriteMatch,
};
use std::fmt;

/// A single-line command with balanced double quotes and at most the one
/// allowed chain.
///
/// Only the normalizer and the follow-up synthesizer build these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalCommand(String);

impl CanonicalCommand {
    pub(crate) fn from_trusted(command: String) -> Self {
        Self(command)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalCommand {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of normalizing raw model output
#[derive(Debug, Clone)]
pub struct Normalization {
    pub command: CanonicalCommand,
    /// Text cut off by compound-command stripping, starting at the operator
    pub discarded: Option<String>,
}

/// Turns untrusted model output into a canonical command.
///
/// Every step is a plain text transformation. Quote repair only counts `"`
/// characters and appends a closing one; it is a heuristic, not a shell
/// quoting parser.
pub struct CommandNormalizer;

impl CommandNormalizer {
    pub fn normalize(raw: &str) -> CanonicalCommand {
        Self::normalize_detailed(raw).command
    }

    pub fn normalize_detailed(raw: &str) -> Normalization {
        let text = Self::strip_reasoning(raw);
        let line = Self::first_line(&text);
        let line = Self::strip_markdown(line);
        let line = Self::normalize_dashes(&line);
        let line = Self::strip_label(&line);
        let line = Self::apply_rewrites(line);
        let line = Self::balance_quotes(line);

        let (line, discarded) = Self::strip_compound(line);
        let line = match discarded {
            // The kept segment may have lost its closing quote or now match a rewrite.
            Some(_) => Self::balance_quotes(Self::apply_rewrites(line)),
            None => line,
        };

        Normalization {
            command: CanonicalCommand::from_trusted(line),
            discarded,
        }
    }

    /// Remove `<think>…</think>` blocks; an unterminated block swallows the rest.
    fn strip_reasoning(raw: &str) -> String {
        const OPEN: &str = "<think>";
        const CLOSE: &str = "</think>";

        let mut text = raw.to_string();

        // Some servers drop the opening tag and only send the close.
        if !text.contains(OPEN) {
            if let Some(end) = text.rfind(CLOSE) {
                text = text[end + CLOSE.len()..].to_string();
            }
        }

        while let Some(start) = text.find(OPEN) {
            match text[start..].find(CLOSE) {
                Some(rel_end) => {
                    text.replace_range(start..start + rel_end + CLOSE.len(), "");
                }
                None => text.truncate(start),
            }
        }

        text.replace(CLOSE, "")
    }

    /// First line carrying content. Blank lines and bare fence lines such as
    /// "```bash" are skipped.
    fn first_line(text: &str) -> &str {
        text.split(['\n', '\r'])
            .map(str::trim)
            .find(|line| !line.is_empty() && !Self::is_fence_line(line))
            .unwrap_or("")
    }

    fn is_fence_line(line: &str) -> bool {
        match line.strip_prefix("```") {
            Some(rest) => !rest.trim_matches('`').trim().contains(char::is_whitespace),
            None => false,
        }
    }

    fn strip_markdown(line: &str) -> String {
        let without_ticks = line.replace('`', "");
        Self::trim_leaders(&without_ticks).to_string()
    }

    fn trim_leaders(line: &str) -> &str {
        line.trim_start_matches(|c: char| MARKDOWN_LEADERS.contains(&c) || c.is_whitespace())
            .trim_end()
    }

    fn normalize_dashes(line: &str) -> String {
        line.chars().fold(String::with_capacity(line.len()), |mut out, c| {
            if DASH_VARIANTS.contains(&c) {
                out.push_str("--");
            } else {
                out.push(c);
            }
            out
        })
    }

    /// Strip labels like "Command:" until none is left.
    fn strip_label(line: &str) -> String {
        let mut current = Self::trim_leaders(line);

        loop {
            let label = LABEL_PREFIXES.iter().find(|label| {
                current
                    .get(..label.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(label))
            });

            match label {
                Some(label) => current = Self::trim_leaders(&current[label.len()..]),
                None => return current.to_string(),
            }
        }
    }

    /// Apply the rewrite table until nothing matches. Prefix replacements are
    /// shorter than their patterns and exact replacements match no pattern,
    /// so this terminates.
    fn apply_rewrites(mut line: String) -> String {
        while let Some(rewritten) = Self::rewrite_once(&line) {
            line = rewritten;
        }
        line
    }

    fn rewrite_once(line: &str) -> Option<String> {
        REWRITE_RULES.iter().find_map(|rule| {
            let head = line.get(..rule.pattern.len())?;
            if !head.eq_ignore_ascii_case(rule.pattern) {
                return None;
            }

            let rest = &line[rule.pattern.len()..];
            match rule.kind {
                RewriteMatch::Exact if rest.is_empty() => Some(rule.replacement.to_string()),
                RewriteMatch::Prefix if rest.is_empty() || rest.starts_with(' ') => {
                    Some(format!("{}{}", rule.replacement, rest))
                }
                _ => None,
            }
        })
    }

    fn balance_quotes(mut line: String) -> String {
        if line.matches('"').count() % 2 == 1 {
            line.push('"');
        }
        line
    }

    /// Cut everything from the first chaining operator unless the command is
    /// exactly the allowed commit-then-push chain.
    fn strip_compound(line: String) -> (String, Option<String>) {
        let operators = policy::chain_operators(&line);
        if operators.is_empty() {
            return (line, None);
        }

        if operators == [ALLOWED_CHAIN.operator] && ALLOWED_CHAIN.matches(&line) {
            return (line, None);
        }

        match policy::find_chain_operator(&line) {
            Some((idx, _)) => {
                let kept = line[..idx].trim_end().to_string();
                let discarded = line[idx..].to_string();
                (kept, Some(discarded))
            }
            None => (line, None),
        }
    }
}
