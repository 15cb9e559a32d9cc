//! Result aggregation - formats accumulated steps into a stable audit text.
//!
//! Pure over its inputs: identical input always yields byte-identical
//! output. One header line, one line per step, one trailer line, joined
//! with `\n`.

use crate::domain::ExecutionStep;

const HEADER: &str =
    "HEADER: STEP n | tool=<tool> | summary=\"...\" | tasks total=T pending=P inProgress=IP completed=C";

/// Summary cap per formatted step line.
const MAX_SUMMARY_CHARS: usize = 200;
const ELLIPSIS: char = '…';

/// Format steps into header + one line per step + trailer.
pub fn format_steps(steps: &[ExecutionStep], terminated: bool, reason: Option<&str>) -> String {
    let mut out = String::from(HEADER);
    for step in steps {
        out.push('\n');
        out.push_str(&format_step_line(step));
    }
    out.push('\n');
    out.push_str(&format_total_line(steps.len(), terminated, reason));
    out
}

fn format_step_line(step: &ExecutionStep) -> String {
    let tool = step
        .tool_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("-");
    let summary = truncate_if_needed(&flatten_summary(&step.result_summary));
    let counts = parse_task_snapshot(step.tasks_snapshot.as_deref());
    format!(
        "STEP {} | tool={} | summary=\"{}\" | tasks total={} pending={} inProgress={} completed={}",
        step.step_number, tool, summary, counts.total, counts.pending, counts.in_progress, counts.completed
    )
}

fn format_total_line(total_steps: usize, terminated: bool, reason: Option<&str>) -> String {
    let reason = match reason {
        Some(r) if !r.trim().is_empty() => r,
        _ => "none",
    };
    format!("TOTAL_STEPS={total_steps} TERMINATED={terminated} REASON={reason}")
}

/// Collapse newlines and runs of whitespace; blank summaries render as `-`.
fn flatten_summary(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "-".to_string();
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_if_needed(summary: &str) -> String {
    if summary.chars().count() <= MAX_SUMMARY_CHARS {
        summary.to_string()
    } else {
        let mut capped: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();
        capped.push(ELLIPSIS);
        capped
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct TaskCounts {
    total: usize,
    pending: usize,
    in_progress: usize,
    completed: usize,
}

/// Parse the comma-separated `id:STATUS` mini-format. Malformed entries and
/// unrecognized statuses are skipped and excluded from the total.
fn parse_task_snapshot(snapshot: Option<&str>) -> TaskCounts {
    let mut counts = TaskCounts::default();
    let Some(snapshot) = snapshot else {
        return counts;
    };
    if snapshot.trim().is_empty() {
        return counts;
    }

    for part in snapshot.split(',') {
        let trimmed = part.trim();
        let Some(idx) = trimmed.find(':') else { continue };
        if idx == 0 || idx == trimmed.len() - 1 {
            continue;
        }
        let status = trimmed[idx + 1..].trim().to_uppercase();
        match status.as_str() {
            "PENDING" => {
                counts.pending += 1;
                counts.total += 1;
            }
            "IN_PROGRESS" => {
                counts.in_progress += 1;
                counts.total += 1;
            }
            "COMPLETED" => {
                counts.completed += 1;
                counts.total += 1;
            }
            _ => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(number: u32, tool: Option<&str>, summary: &str, tasks: Option<&str>) -> ExecutionStep {
        ExecutionStep::new(
            number,
            "prompt",
            tool.map(String::from),
            summary,
            tasks.map(String::from),
        )
    }

    #[test]
    fn test_empty_steps_render_header_and_trailer_only() {
        let text = format_steps(&[], true, Some("STEP_LIMIT"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "TOTAL_STEPS=0 TERMINATED=true REASON=STEP_LIMIT");
    }

    #[test]
    fn test_step_line_format() {
        let steps = vec![step(1, Some("read"), "Read main.rs", Some("t1:PENDING,t2:COMPLETED"))];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert!(text.contains(
            "STEP 1 | tool=read | summary=\"Read main.rs\" | tasks total=2 pending=1 inProgress=0 completed=1"
        ));
    }

    #[test]
    fn test_missing_tool_renders_placeholder() {
        let steps = vec![step(1, None, "thinking", None)];
        let text = format_steps(&steps, true, None);
        assert!(text.contains("STEP 1 | tool=- |"));
    }

    #[test]
    fn test_missing_reason_renders_none() {
        let text = format_steps(&[], false, None);
        assert!(text.ends_with("TOTAL_STEPS=0 TERMINATED=false REASON=none"));

        let text = format_steps(&[], true, Some("  "));
        assert!(text.ends_with("REASON=none"));
    }

    #[test]
    fn test_summary_truncated_at_200_chars_with_ellipsis() {
        let long = "s".repeat(205);
        let steps = vec![step(1, None, &long, None)];
        let text = format_steps(&steps, true, Some("COMPLETED"));

        let expected = format!("summary=\"{}…\"", "s".repeat(200));
        assert!(text.contains(&expected));
        assert!(!text.contains(&"s".repeat(201)));
    }

    #[test]
    fn test_summary_exactly_200_chars_not_truncated() {
        let exact = "s".repeat(200);
        let steps = vec![step(1, None, &exact, None)];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert!(text.contains(&format!("summary=\"{exact}\"")));
        assert!(!text.contains(ELLIPSIS));
    }

    #[test]
    fn test_newlines_flattened_in_summary() {
        let steps = vec![step(1, None, "line one\nline   two\r\nline three", None)];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert!(text.contains("summary=\"line one line two line three\""));
    }

    #[test]
    fn test_blank_summary_renders_dash() {
        let steps = vec![step(1, None, "   ", None)];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert!(text.contains("summary=\"-\""));
    }

    #[test]
    fn test_task_counts_all_statuses_case_insensitive() {
        let counts = parse_task_snapshot(Some("a:pending, b:In_Progress, c:COMPLETED, d:completed"));
        assert_eq!(
            counts,
            TaskCounts {
                total: 4,
                pending: 1,
                in_progress: 1,
                completed: 2
            }
        );
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let counts = parse_task_snapshot(Some("no-colon, :empty-id, dangling:, e:UNKNOWN, f:PENDING"));
        assert_eq!(
            counts,
            TaskCounts {
                total: 1,
                pending: 1,
                in_progress: 0,
                completed: 0
            }
        );
    }

    #[test]
    fn test_garbled_snapshot_yields_zero_counts() {
        for snapshot in [None, Some(""), Some("   "), Some("complete garbage here")] {
            let counts = parse_task_snapshot(snapshot);
            assert_eq!(counts, TaskCounts::default(), "snapshot {snapshot:?}");
        }

        let steps = vec![step(1, None, "x", Some("complete garbage here"))];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert!(text.contains("tasks total=0 pending=0 inProgress=0 completed=0"));
    }

    #[test]
    fn test_format_is_deterministic() {
        let steps = vec![
            step(1, Some("read"), "Read a file", Some("t1:PENDING")),
            step(2, None, "thought about it", None),
        ];
        let first = format_steps(&steps, true, Some("STEP_LIMIT"));
        let second = format_steps(&steps, true, Some("STEP_LIMIT"));
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_uses_newline_separator_without_trailing_newline() {
        let steps = vec![step(1, None, "x", None)];
        let text = format_steps(&steps, true, Some("COMPLETED"));
        assert_eq!(text.lines().count(), 3);
        assert!(!text.ends_with('\n'));
    }
}
