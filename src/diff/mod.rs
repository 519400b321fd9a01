//! Line-based diff between two versions of a compose file.
//!
//! Used to render before/after comparisons of AI-suggested edits. The
//! algorithm is a greedy forward scan with a nearest-occurrence tie-break,
//! not a minimal-edit-distance diff; inputs are configuration files of at
//! most a few hundred lines, so the O(n·m) forward searches are fine and
//! the output is good enough for human review.

use std::fmt::Write as _;

/// How a single output line relates to the two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Unchanged,
}

/// One line of comparison output, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

impl DiffLine {
    fn new(kind: DiffKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Compute a line diff between `old` and `new`.
///
/// Both inputs are split on `\n`; an empty input is a single empty line,
/// matching standard split semantics. Lines matched in both sequences are
/// emitted once as [`DiffKind::Unchanged`]; lines only in `old` come out
/// [`DiffKind::Removed`] and lines only in `new` come out
/// [`DiffKind::Added`], interleaved in scan order.
///
/// When the cursors disagree and both lines recur later in the other
/// sequence, the match at the lower index wins (ties go to `Removed`).
/// With many duplicate lines this heuristic can pair a line with a far
/// occurrence instead of its true counterpart; the output is still a
/// total, order-preserving cover of both inputs.
pub fn diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let mut out = Vec::with_capacity(old_lines.len().max(new_lines.len()));

    let mut old_idx = 0;
    let mut new_idx = 0;

    while old_idx < old_lines.len() && new_idx < new_lines.len() {
        if old_lines[old_idx] == new_lines[new_idx] {
            out.push(DiffLine::new(DiffKind::Unchanged, old_lines[old_idx]));
            old_idx += 1;
            new_idx += 1;
            continue;
        }

        let old_in_new = find_from(&new_lines, new_idx, old_lines[old_idx]);
        let new_in_old = find_from(&old_lines, old_idx, new_lines[new_idx]);

        match (old_in_new, new_in_old) {
            // The new-cursor line never appears in the rest of old: pure insertion.
            (_, None) => {
                out.push(DiffLine::new(DiffKind::Added, new_lines[new_idx]));
                new_idx += 1;
            }
            // The old-cursor line never appears in the rest of new: pure deletion.
            (None, Some(_)) => {
                out.push(DiffLine::new(DiffKind::Removed, old_lines[old_idx]));
                old_idx += 1;
            }
            // Both recur later; whichever match is closer is assumed correct.
            (Some(oin), Some(nio)) => {
                if oin <= nio {
                    out.push(DiffLine::new(DiffKind::Removed, old_lines[old_idx]));
                    old_idx += 1;
                } else {
                    out.push(DiffLine::new(DiffKind::Added, new_lines[new_idx]));
                    new_idx += 1;
                }
            }
        }
    }

    // Flush whatever is left on either side, old first.
    for line in &old_lines[old_idx..] {
        out.push(DiffLine::new(DiffKind::Removed, line));
    }
    for line in &new_lines[new_idx..] {
        out.push(DiffLine::new(DiffKind::Added, line));
    }

    out
}

fn find_from(haystack: &[&str], from: usize, needle: &str) -> Option<usize> {
    haystack[from..]
        .iter()
        .position(|line| *line == needle)
        .map(|offset| from + offset)
}

/// Render a diff with dual line-number gutters and a `+`/`-` operator
/// column, the same layout the editor's diff viewer uses.
pub fn render(lines: &[DiffLine]) -> String {
    let mut old_no = 1usize;
    let mut new_no = 1usize;
    let mut out = String::new();

    for line in lines {
        let (old_col, new_col, op) = match line.kind {
            DiffKind::Added => {
                let n = new_no;
                new_no += 1;
                (String::new(), n.to_string(), '+')
            }
            DiffKind::Removed => {
                let o = old_no;
                old_no += 1;
                (o.to_string(), String::new(), '-')
            }
            DiffKind::Unchanged => {
                let o = old_no;
                let n = new_no;
                old_no += 1;
                new_no += 1;
                (o.to_string(), n.to_string(), ' ')
            }
        };
        let _ = writeln!(out, "{:>4} {:>4} {} {}", old_col, new_col, op, line.text);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_are_all_unchanged() {
        let text = "services:\n  web:\n    image: nginx";
        let result = diff(text, text);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|l| l.kind == DiffKind::Unchanged));
        let joined: Vec<&str> = result.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined.join("\n"), text);
    }

    #[test]
    fn empty_input_is_a_single_empty_unchanged_line() {
        let result = diff("", "");
        assert_eq!(result, vec![DiffLine::new(DiffKind::Unchanged, "")]);
    }

    #[test]
    fn disjoint_inputs_remove_then_add() {
        let result = diff("a\nb", "c\nd");
        let removed: Vec<&str> = result
            .iter()
            .filter(|l| l.kind == DiffKind::Removed)
            .map(|l| l.text.as_str())
            .collect();
        let added: Vec<&str> = result
            .iter()
            .filter(|l| l.kind == DiffKind::Added)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(removed, vec!["a", "b"]);
        assert_eq!(added, vec!["c", "d"]);
        assert!(result.iter().all(|l| l.kind != DiffKind::Unchanged));
    }

    #[test]
    fn single_middle_change_keeps_prefix_and_suffix() {
        let result = diff("a\nb\nc", "a\nx\nc");
        assert_eq!(result[0], DiffLine::new(DiffKind::Unchanged, "a"));
        assert_eq!(result[3], DiffLine::new(DiffKind::Unchanged, "c"));
        assert!(matches!(
            &result[1..3],
            [
                DiffLine {
                    kind: DiffKind::Removed,
                    ..
                },
                DiffLine {
                    kind: DiffKind::Added,
                    ..
                }
            ] | [
                DiffLine {
                    kind: DiffKind::Added,
                    ..
                },
                DiffLine {
                    kind: DiffKind::Removed,
                    ..
                }
            ]
        ));
    }

    #[test]
    fn totality_reconstructs_both_sides() {
        let old = "version: '3'\nservices:\n  web:\n    image: nginx\n    ports:\n      - 80:80";
        let new = "services:\n  web:\n    image: nginx:1.27\n    ports:\n      - 80:80\n    restart: always";
        let result = diff(old, new);

        let old_side: Vec<&str> = result
            .iter()
            .filter(|l| l.kind != DiffKind::Added)
            .map(|l| l.text.as_str())
            .collect();
        let new_side: Vec<&str> = result
            .iter()
            .filter(|l| l.kind != DiffKind::Removed)
            .map(|l| l.text.as_str())
            .collect();

        assert_eq!(old_side.join("\n"), old);
        assert_eq!(new_side.join("\n"), new);
    }

    #[test]
    fn duplicate_blank_lines_still_cover_both_inputs() {
        // The nearest-occurrence heuristic may mis-align which blank line
        // pairs with which, but totality must hold regardless.
        let old = "a\n\nb\n\nc";
        let new = "a\n\nx\n\nc";
        let result = diff(old, new);

        let old_side: Vec<&str> = result
            .iter()
            .filter(|l| l.kind != DiffKind::Added)
            .map(|l| l.text.as_str())
            .collect();
        let new_side: Vec<&str> = result
            .iter()
            .filter(|l| l.kind != DiffKind::Removed)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(old_side.join("\n"), old);
        assert_eq!(new_side.join("\n"), new);
    }

    #[test]
    fn pure_addition_in_middle() {
        let result = diff("a\nc", "a\nb\nc");
        assert_eq!(
            result,
            vec![
                DiffLine::new(DiffKind::Unchanged, "a"),
                DiffLine::new(DiffKind::Added, "b"),
                DiffLine::new(DiffKind::Unchanged, "c"),
            ]
        );
    }

    #[test]
    fn pure_deletion_in_middle() {
        let result = diff("a\nb\nc", "a\nc");
        assert_eq!(
            result,
            vec![
                DiffLine::new(DiffKind::Unchanged, "a"),
                DiffLine::new(DiffKind::Removed, "b"),
                DiffLine::new(DiffKind::Unchanged, "c"),
            ]
        );
    }

    #[test]
    fn deterministic_output() {
        let old = "x\ny\nz";
        let new = "x\nz\ny";
        assert_eq!(diff(old, new), diff(old, new));
    }

    #[test]
    fn render_numbers_both_gutters() {
        let rendered = render(&diff("a\nb", "a\nc"));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "   1    1   a");
        assert!(lines.iter().any(|l| l.contains("- b")));
        assert!(lines.iter().any(|l| l.contains("+ c")));
    }
}
