//! Static policy data shared by the normalizer and the classifier.
//!
//! Every rule the pipeline applies lives in one of the tables below so the
//! policy can be read and tested on its own, independent of control flow.
//! Tables are ordered: the first matching entry wins.

use std::fmt;

/// Programs a command may invoke. Matching always requires the trailing space,
/// so `gitignore push` or a bare `git` never pass.
pub const ALLOWED_PROGRAMS: &[&str] = &["git", "gh"];

/// Operators that chain, pipe, background or redirect a shell invocation.
/// A line break separates statements for `sh -c` just like `;`.
///
/// Longer operators come first so `&&` is reported before `&`.
pub const CHAIN_OPERATORS: &[&str] = &["&&", "||", "|", ";", "&", ">", "<", "\n", "\r"];

/// The one compound command the policy tolerates: a commit immediately
/// followed by a push.
pub const ALLOWED_CHAIN: AllowedChain = AllowedChain {
    first: "git commit",
    operator: "&&",
    then: "git push",
};

#[derive(Debug, Clone, Copy)]
pub struct AllowedChain {
    pub first: &'static str,
    pub operator: &'static str,
    pub then: &'static str,
}

impl AllowedChain {
    /// True when `command` is exactly `<first …> && <then …>` with a single
    /// operator occurrence.
    pub fn matches(&self, command: &str) -> bool {
        let mut parts = command.split(self.operator);
        let (Some(left), Some(right), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };

        is_invocation_of(left.trim(), self.first) && is_invocation_of(right.trim(), self.then)
    }
}

/// `command` is `head` itself or `head` followed by a space and arguments.
pub fn is_invocation_of(command: &str, head: &str) -> bool {
    command == head
        || command
            .strip_prefix(head)
            .is_some_and(|rest| rest.starts_with(' '))
}

/// Labels models like to put in front of the command. Matched case-insensitively.
pub const LABEL_PREFIXES: &[&str] = &[
    "command:", "cmd:", "shell:", "bash:", "answer:", "output:", "$ ",
];

/// Leading markdown symbols stripped from the start of a line.
pub const MARKDOWN_LEADERS: &[char] = &['*', '#', '>'];

/// Typographic dashes models emit in place of `--`.
pub const DASH_VARIANTS: &[char] = &['\u{2013}', '\u{2014}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMatch {
    /// The whole command must equal the pattern.
    Exact,
    /// The command must be the pattern or start with the pattern plus a space;
    /// the remainder is kept.
    Prefix,
}

/// A known hallucination and its safe equivalent.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    pub pattern: &'static str,
    pub replacement: &'static str,
    pub kind: RewriteMatch,
}

/// Fixed substitution table. This is not general repair: anything not listed
/// passes through untouched.
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        pattern: "git merge -y",
        replacement: "git commit -am \"update\"",
        kind: RewriteMatch::Exact,
    },
    RewriteRule {
        pattern: "git merge --yes",
        replacement: "git commit -am \"update\"",
        kind: RewriteMatch::Exact,
    },
    RewriteRule {
        pattern: "git push --yes",
        replacement: "git push",
        kind: RewriteMatch::Prefix,
    },
    RewriteRule {
        pattern: "git commit -y",
        replacement: "git commit",
        kind: RewriteMatch::Prefix,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyCategory {
    RecursiveDelete,
    PrivilegeEscalation,
    Redirection,
    StatementSeparation,
    Piping,
    CommandSubstitution,
    SystemPower,
    ForceFlag,
    HistoryRewrite,
}

impl fmt::Display for DenyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DenyCategory::RecursiveDelete => "file deletion",
            DenyCategory::PrivilegeEscalation => "privilege escalation",
            DenyCategory::Redirection => "shell redirection",
            DenyCategory::StatementSeparation => "statement separation",
            DenyCategory::Piping => "piping",
            DenyCategory::CommandSubstitution => "command substitution",
            DenyCategory::SystemPower => "system shutdown or reboot",
            DenyCategory::ForceFlag => "destructive force flag",
            DenyCategory::HistoryRewrite => "history rewrite",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DenyRule {
    pub pattern: &'static str,
    pub category: DenyCategory,
}

const fn deny(pattern: &'static str, category: DenyCategory) -> DenyRule {
    DenyRule { pattern, category }
}

/// Substrings that reject a command wherever they appear, case-insensitively.
///
/// Plain substring matching is imprecise. `git commit -am
/// "rm old file"` is rejected because the message contains `rm `, and an
/// obfuscated variant such as `r''m` slips through. Quoted text is not
/// exempt. The list is a filter in front of human confirmation, not a sandbox.
pub const DENY_RULES: &[DenyRule] = &[
    deny("rm -rf", DenyCategory::RecursiveDelete),
    deny("rm -fr", DenyCategory::RecursiveDelete),
    deny("rm -r", DenyCategory::RecursiveDelete),
    deny("rm ", DenyCategory::RecursiveDelete),
    deny("rmdir", DenyCategory::RecursiveDelete),
    deny("sudo", DenyCategory::PrivilegeEscalation),
    deny("su -", DenyCategory::PrivilegeEscalation),
    deny("doas ", DenyCategory::PrivilegeEscalation),
    deny("chmod ", DenyCategory::PrivilegeEscalation),
    deny("chown ", DenyCategory::PrivilegeEscalation),
    deny(">", DenyCategory::Redirection),
    deny("<", DenyCategory::Redirection),
    deny(";", DenyCategory::StatementSeparation),
    deny("|", DenyCategory::Piping),
    deny("$(", DenyCategory::CommandSubstitution),
    deny("`", DenyCategory::CommandSubstitution),
    deny("shutdown", DenyCategory::SystemPower),
    deny("reboot", DenyCategory::SystemPower),
    deny("poweroff", DenyCategory::SystemPower),
    deny("halt", DenyCategory::SystemPower),
    deny("mkfs", DenyCategory::SystemPower),
    deny("dd if=", DenyCategory::SystemPower),
    deny("--force", DenyCategory::ForceFlag),
    deny(" -f", DenyCategory::ForceFlag),
    deny("reset --hard", DenyCategory::HistoryRewrite),
    deny("filter-branch", DenyCategory::HistoryRewrite),
    deny("push --mirror", DenyCategory::HistoryRewrite),
];

/// First deny rule hit by `command`, compared case-insensitively.
pub fn first_denied(command: &str) -> Option<&'static DenyRule> {
    let lowered = command.to_lowercase();
    DENY_RULES.iter().find(|rule| lowered.contains(rule.pattern))
}

/// Byte offset and text of the first chaining operator outside quotes.
///
/// Quote tracking toggles on `"` and `'` and knows nothing about escapes.
pub fn find_chain_operator(command: &str) -> Option<(usize, &'static str)> {
    let mut quote: Option<char> = None;

    for (idx, ch) in command.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None => {
                let rest = &command[idx..];
                if let Some(op) = CHAIN_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                    return Some((idx, op));
                }
            }
        }
    }

    None
}

/// Every chaining operator in `command`, quoted or not, in order of appearance.
///
/// Used for the allow decision. Quote tracking there could be fooled by
/// escapes such as `\"` that the shell does not treat as quotes.
pub fn all_chain_operators(command: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    let mut rest = command;

    while !rest.is_empty() {
        match CHAIN_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                found.push(*op);
                rest = &rest[op.len()..];
            }
            None => {
                let skip = rest.chars().next().map_or(1, char::len_utf8);
                rest = &rest[skip..];
            }
        }
    }

    found
}

/// Every chaining operator outside quotes, in order of appearance.
pub fn chain_operators(command: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    let mut offset = 0;

    while let Some((idx, op)) = find_chain_operator(&command[offset..]) {
        found.push(op);
        offset += idx + op.len();
    }

    found
}
