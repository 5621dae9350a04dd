//! `git status --porcelain` (v1) parsing.

use super::{FileStatusKind, GitFileStatus, GitStatus};

fn kind_for(code: char) -> Option<FileStatusKind> {
    match code {
        'M' | 'T' => Some(FileStatusKind::Modified),
        'A' => Some(FileStatusKind::Added),
        'D' => Some(FileStatusKind::Deleted),
        'R' => Some(FileStatusKind::Renamed),
        'C' => Some(FileStatusKind::Copied),
        _ => None,
    }
}

/// Undo git's C-style quoting of unusual paths.
fn unquote(path: &str) -> String {
    let inner = match path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner,
        None => return path.to_string(),
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('"') => bytes.push(b'"'),
            Some('\\') => bytes.push(b'\\'),
            Some(d) if d.is_digit(8) => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(8)) {
                        Some(v) => {
                            value = value * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse one porcelain line. Returns `None` for lines too short to carry a path.
pub fn parse_line(line: &str) -> Option<GitFileStatus> {
    let mut chars = line.chars();
    let x = chars.next()?;
    let y = chars.next()?;
    let rest = chars.as_str();
    let raw_path = rest.strip_prefix(' ').unwrap_or(rest);
    if raw_path.is_empty() {
        return None;
    }

    if x == '?' && y == '?' {
        return Some(GitFileStatus {
            path: unquote(raw_path),
            orig_path: None,
            kind: FileStatusKind::Untracked,
            staged: false,
        });
    }

    // Conflicts (U, AA, DD) and anything unseen degrade to unstaged modified.
    let conflicted = x == 'U' || y == 'U' || (x == y && (x == 'A' || x == 'D'));
    let (kind, staged) = if conflicted {
        (FileStatusKind::Modified, false)
    } else if let Some(kind) = kind_for(x) {
        (kind, true)
    } else if let Some(kind) = kind_for(y) {
        (kind, false)
    } else {
        (FileStatusKind::Modified, false)
    };

    let (orig_path, path) = match kind {
        FileStatusKind::Renamed | FileStatusKind::Copied => match raw_path.split_once(" -> ") {
            Some((from, to)) => (Some(unquote(from)), unquote(to)),
            None => (None, unquote(raw_path)),
        },
        _ => (None, unquote(raw_path)),
    };

    Some(GitFileStatus {
        path,
        orig_path,
        kind,
        staged,
    })
}

pub fn parse_porcelain(output: &str) -> GitStatus {
    GitStatus::from_files(output.lines().filter_map(parse_line).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mixed_fixture_partitions_into_buckets() {
        let output = "M  src/staged.rs\n M src/unstaged.rs\n?? notes.txt\nA  src/new.rs\n";
        let status = parse_porcelain(output);

        assert!(status.is_dirty);
        assert_eq!(status.files.len(), 4);
        assert_eq!(status.new_files(), vec!["src/new.rs"]);
        assert_eq!(
            status.modified_files(),
            vec!["src/staged.rs", "src/unstaged.rs"]
        );
        assert_eq!(status.untracked_files(), vec!["notes.txt"]);
        assert!(status.deleted_files().is_empty());

        assert!(status.files[0].staged);
        assert!(!status.files[1].staged);
        assert!(!status.files[2].staged);
        assert!(status.files[3].staged);
    }

    #[test]
    fn renames_keep_both_paths() {
        let entry = parse_line("R  old/name.rs -> new/name.rs").unwrap();
        assert_eq!(entry.kind, FileStatusKind::Renamed);
        assert_eq!(entry.path, "new/name.rs");
        assert_eq!(entry.orig_path.as_deref(), Some("old/name.rs"));
        assert!(entry.staged);
    }

    #[test]
    fn unknown_and_conflict_codes_degrade_to_unstaged_modified() {
        for line in ["UU both.rs", "XZ weird.rs", "AA added-twice.rs"] {
            let entry = parse_line(line).unwrap();
            assert_eq!(entry.kind, FileStatusKind::Modified, "{}", line);
            assert!(!entry.staged, "{}", line);
        }
    }

    #[test]
    fn quoted_paths_are_unescaped() {
        let entry = parse_line(r#"?? "with space\tand \"quote\".txt""#).unwrap();
        assert_eq!(entry.path, "with space\tand \"quote\".txt");

        let entry = parse_line(r#" M "caf\303\251.txt""#).unwrap();
        assert_eq!(entry.path, "café.txt");
    }

    #[test]
    fn short_lines_are_skipped() {
        assert!(parse_line("").is_none());
        assert!(parse_line("M").is_none());
        assert!(parse_line("M ").is_none());
        assert!(parse_porcelain("\n\n").is_clean());
    }

    proptest! {
        #[test]
        fn every_well_formed_line_yields_one_entry(
            codes in prop::collection::vec(
                (prop::sample::select(vec![' ', 'M', 'A', 'D', 'R', 'C', 'U', 'T', '?', '!', 'Z']),
                 prop::sample::select(vec![' ', 'M', 'A', 'D', 'U', 'T', '?', 'Z'])),
                0..20,
            ),
            names in prop::collection::vec("[a-zA-Z0-9_./-]{1,24}", 20),
        ) {
            let output: String = codes
                .iter()
                .zip(names.iter())
                .map(|((x, y), name)| format!("{}{} {}\n", x, y, name))
                .collect();
            let status = parse_porcelain(&output);
            prop_assert_eq!(status.files.len(), codes.len());
            let dirty = status.files.iter().any(|f| f.kind != FileStatusKind::Untracked || f.staged);
            prop_assert_eq!(status.is_dirty, dirty);
        }

        #[test]
        fn arbitrary_input_never_panics(input in "\\PC{0,200}") {
            let _ = parse_porcelain(&input);
        }
    }
}
