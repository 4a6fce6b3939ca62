//! Command substitution
//!
//! Replaces `$(...)` markers with the standard output of running their
//! contents through the user's shell.

use crate::error::{SubstitutionError, SubstitutionResult};
use std::env;
use std::ops::Range;
use std::process::{Command as StdCommand, Stdio};

/// Shell used when `SHELL` is not set
pub const DEFAULT_SHELL: &str = "sh";

/// A `$(...)` marker found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    /// Byte offset of the `$`
    pub start: usize,
    /// Byte offset just past the closing `)`
    pub end: usize,
    /// The shell text between the parentheses
    pub command: &'a str,
}

/// The user's preferred shell, from `SHELL` or the fallback
pub fn preferred_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Find every complete `$(...)` marker in `text`
///
/// Parentheses inside a marker must balance. An unterminated `$(` is not a
/// marker and is left as-is; scanning resumes right after it.
pub fn find_markers(text: &str) -> Vec<Marker<'_>> {
    find_markers_where(text, |_| true)
}

// Only a `$(` whose both bytes satisfy `literal` opens a marker.
fn find_markers_where(text: &str, literal: impl Fn(usize) -> bool) -> Vec<Marker<'_>> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'(' || !literal(i) || !literal(i + 1) {
            i += 1;
            continue;
        }

        let body_start = i + 2;
        let mut depth = 1usize;
        let mut j = body_start;
        while j < bytes.len() {
            match bytes[j] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }

        if depth != 0 {
            i = body_start;
            continue;
        }

        markers.push(Marker {
            start: i,
            end: j + 1,
            command: &text[body_start..j],
        });
        i = j + 1;
    }

    markers
}

/// Replace every marker in `text` with its command's output
///
/// Commands run one at a time in order of appearance. Output is inserted
/// as-is and is not scanned for further markers.
pub fn substitute_commands(text: &str) -> SubstitutionResult<String> {
    replace_markers(text, find_markers(text))
}

/// Like [`substitute_commands`], but a `$(` inside one of the `inserted`
/// byte ranges is plain text
///
/// A marker opened in the surrounding text may still span inserted ranges.
pub fn substitute_literal_commands(
    text: &str,
    inserted: &[Range<usize>],
) -> SubstitutionResult<String> {
    let markers = find_markers_where(text, |at| {
        !inserted.iter().any(|range| range.contains(&at))
    });
    replace_markers(text, markers)
}

fn replace_markers(text: &str, markers: Vec<Marker<'_>>) -> SubstitutionResult<String> {
    if markers.is_empty() {
        return Ok(text.to_string());
    }

    let shell = preferred_shell();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for marker in markers {
        out.push_str(&text[last..marker.start]);
        out.push_str(&capture_command_output(&shell, marker.command)?);
        last = marker.end;
    }
    out.push_str(&text[last..]);

    Ok(out)
}

/// Run `command` with `shell -c` and return its stdout without the trailing newline
///
/// Stdin and stderr are inherited so prompts reach the terminal.
pub fn capture_command_output(shell: &str, command: &str) -> SubstitutionResult<String> {
    log::debug!("Substituting output of `{}` (shell: {})", command, shell);

    let output = StdCommand::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| SubstitutionError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SubstitutionError::Failed {
            command: command.to_string(),
            code: output.status.code(),
        });
    }

    let mut stdout = String::from_utf8(output.stdout)
        .map_err(|_| SubstitutionError::InvalidUtf8(command.to_string()))?;
    if stdout.ends_with('\n') {
        stdout.pop();
    }
    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_single_marker() {
        let markers = find_markers("host=$(hostname) end");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].command, "hostname");
        assert_eq!(markers[0].start, 5);
        assert_eq!(markers[0].end, 16);
    }

    #[test]
    fn test_find_multiple_markers_non_greedy() {
        let markers = find_markers("$(echo a) and $(echo b)");
        let commands: Vec<&str> = markers.iter().map(|m| m.command).collect();
        assert_eq!(commands, vec!["echo a", "echo b"]);
    }

    #[test]
    fn test_find_balanced_parens() {
        let markers = find_markers("$(echo $(date) (x))");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].command, "echo $(date) (x)");
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        assert!(find_markers("price: $(5").is_empty());
        assert_eq!(substitute_commands("price: $(5").unwrap(), "price: $(5");
    }

    #[test]
    fn test_scan_continues_after_unbalanced_marker() {
        let markers = find_markers("x $(echo ( y $(echo hi)");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].command, "echo hi");
        assert_eq!(
            substitute_commands("x $(echo ( y $(echo hi)").unwrap(),
            "x $(echo ( y hi"
        );
    }

    #[test]
    fn test_inserted_text_is_not_a_marker() {
        let text = "$(echo a) $(echo b)";
        let result = substitute_literal_commands(text, &[10..19]).unwrap();
        assert_eq!(result, "a $(echo b)");
    }

    #[test]
    fn test_literal_marker_may_span_inserted_text() {
        let text = "$(echo hello world)";
        let result = substitute_literal_commands(text, &[12..17]).unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_no_markers() {
        assert_eq!(substitute_commands("$HOME and ${USER}").unwrap(), "$HOME and ${USER}");
    }

    #[test]
    fn test_capture_strips_one_trailing_newline() {
        let output = capture_command_output(DEFAULT_SHELL, "printf 'hi\\n\\n'").unwrap();
        assert_eq!(output, "hi\n");
    }

    #[test]
    fn test_substitute_commands() {
        let result = substitute_commands("[$(echo hello)] [$(echo world)]").unwrap();
        assert_eq!(result, "[hello] [world]");
    }

    #[test]
    fn test_output_is_not_rescanned() {
        let result = substitute_commands("$(printf '%s' '$(echo nested)')").unwrap();
        assert_eq!(result, "$(echo nested)");
    }

    #[test]
    fn test_failing_command() {
        let result = substitute_commands("$(exit 3)");
        assert!(matches!(
            result,
            Err(SubstitutionError::Failed { code: Some(3), .. })
        ));
    }
}
