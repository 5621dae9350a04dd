//! Stash list parsing and checkpoint markers.

use super::StashEntry;
use chrono::{TimeZone, Utc};
use tracing::warn;

/// Format passed to `git stash list --format=`.
pub const LIST_FORMAT: &str = "%H|%gd|%s|%ct";

const DEFAULT_MESSAGE: &str = "devsnap checkpoint";

/// Unique token embedded in a checkpoint message so it can be found again.
pub fn new_marker() -> String {
    format!("devsnap-{}", uuid::Uuid::new_v4().simple())
}

pub fn checkpoint_message(message: Option<&str>, marker: &str) -> String {
    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MESSAGE);
    format!("{} [{}]", message, marker)
}

/// Parse one `hash|ref|message|timestamp` line. The message may contain `|`.
pub fn parse_list_line(line: &str) -> Option<StashEntry> {
    let mut head = line.splitn(3, '|');
    let id = head.next()?.trim();
    let reference = head.next()?.trim();
    let (message, ts) = head.next()?.rsplit_once('|')?;
    if id.is_empty() || reference.is_empty() {
        return None;
    }
    let seconds: i64 = ts.trim().parse().ok()?;
    let timestamp = Utc.timestamp_opt(seconds, 0).single()?;
    Some(StashEntry {
        id: id.to_string(),
        reference: reference.to_string(),
        message: message.to_string(),
        timestamp,
        branch: "unknown".to_string(),
    })
}

pub fn parse_list(output: &str) -> Vec<StashEntry> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let entry = parse_list_line(line);
            if entry.is_none() {
                warn!("Skipping unparseable stash list line: {}", line);
            }
            entry
        })
        .collect()
}

/// Find a stash by hash, hash prefix or reference.
pub fn find<'a>(entries: &'a [StashEntry], id: &str) -> Option<&'a StashEntry> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|e| e.id == id || e.reference == id)
        .or_else(|| {
            if id.len() >= 7 {
                entries.iter().find(|e| e.id.starts_with(id))
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
1111111111111111111111111111111111111111|stash@{0}|On main: wip [devsnap-abc]|1700000000
2222222222222222222222222222222222222222|stash@{1}|On feature: a|b|c|1690000000
garbage line
";

    #[test]
    fn parses_entries_with_pipes_in_message() {
        let entries = parse_list(LIST);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].reference, "stash@{0}");
        assert_eq!(entries[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(entries[1].message, "On feature: a|b|c");
        assert!(entries.iter().all(|e| e.branch == "unknown"));
    }

    #[test]
    fn find_accepts_hash_prefix_and_reference() {
        let entries = parse_list(LIST);
        assert_eq!(find(&entries, "stash@{1}").unwrap().id, entries[1].id);
        assert_eq!(find(&entries, "2222222").unwrap().reference, "stash@{1}");
        assert!(find(&entries, "22").is_none());
        assert!(find(&entries, "3333333333").is_none());
    }

    #[test]
    fn checkpoint_message_embeds_marker() {
        let marker = new_marker();
        assert!(marker.starts_with("devsnap-"));
        assert_ne!(marker, new_marker());
        assert_eq!(
            checkpoint_message(Some("  "), "devsnap-x"),
            "devsnap checkpoint [devsnap-x]"
        );
        assert_eq!(checkpoint_message(Some("wip"), "devsnap-x"), "wip [devsnap-x]");
    }
}
