//! Chat message rendering for issue batches.

use crate::github::Issue;
use crate::monitor::RepoRef;

/// Maximum issues listed individually in one message.
pub const MAX_LISTED_ISSUES: usize = 5;

/// Discord's message content limit, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Render a batch of issues as a single chat message.
///
/// Lists the first [`MAX_LISTED_ISSUES`] issues, summarises the rest, and
/// truncates the result to [`MAX_MESSAGE_CHARS`] characters.
pub fn format_issue_message(issues: &[Issue], repo: &RepoRef) -> String {
    let listed = issues
        .iter()
        .take(MAX_LISTED_ISSUES)
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n\n");

    let summary = if issues.len() > MAX_LISTED_ISSUES {
        format!(
            "\n\n...and {} more issues",
            issues.len() - MAX_LISTED_ISSUES
        )
    } else {
        String::new()
    };

    let plural = if issues.len() == 1 { "" } else { "s" };
    let content = format!(
        "🔍 **{repo}**: Found {} new issue{plural}!\n\n{listed}{summary}",
        issues.len()
    );
    truncate_chars(content, MAX_MESSAGE_CHARS)
}

fn format_entry(issue: &Issue) -> String {
    let labels = if issue.labels.is_empty() {
        "no labels".to_owned()
    } else {
        issue.labels.join(", ")
    };
    format!(
        "• **#{}**: [{}]({})\n  👤 {} | 🏷 {}",
        issue.number, issue.title, issue.url, issue.author, labels
    )
}

fn truncate_chars(content: String, max: usize) -> String {
    if content.chars().count() <= max {
        return content;
    }
    let mut out: String = content.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
