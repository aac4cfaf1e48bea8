//! Begin/end markers that delimit an installed completion block.
//!
//! ```text
//! # BEGIN compline completion v1 [bash]
//! ...script...
//! # END compline completion [bash]
//! ```
//!
//! The begin line carries the block format version so a later release can
//! recognize (and replace) blocks written by an older one. Markers are scoped
//! to one CLI and one shell: blocks for other CLIs or shells in the same file
//! are invisible to this marker.

use std::path::Path;

use regex::Regex;

use crate::shell::ShellKind;
use crate::{Error, Result};

/// Version of the block layout written by this release.
pub const FORMAT_VERSION: u32 = 1;

/// Marker pair for one CLI and shell.
#[derive(Debug, Clone)]
pub struct CompletionMarker {
    cli_name: String,
    shell: ShellKind,
    begin: Regex,
    end: Regex,
}

/// Location of one block inside a profile, as zero-based line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Line holding the begin marker.
    pub begin: usize,
    /// Line holding the end marker (inclusive).
    pub end: usize,
    /// Format version recorded in the begin marker.
    pub version: u32,
}

impl CompletionMarker {
    /// Markers for `cli_name` completions in `shell`.
    pub fn new(cli_name: &str, shell: ShellKind) -> Result<Self> {
        let cli = regex::escape(cli_name);
        let shell_name = shell.name();
        let begin = Regex::new(&format!(
            r"^\s*# BEGIN {cli} completion v(\d+) \[{shell_name}\]\s*$"
        ))
        .map_err(|e| Error::Structural(format!("invalid marker pattern: {e}")))?;
        let end = Regex::new(&format!(r"^\s*# END {cli} completion \[{shell_name}\]\s*$"))
            .map_err(|e| Error::Structural(format!("invalid marker pattern: {e}")))?;
        Ok(Self {
            cli_name: cli_name.to_string(),
            shell,
            begin,
            end,
        })
    }

    /// Begin line for the current format version.
    pub fn begin_line(&self) -> String {
        format!(
            "# BEGIN {} completion v{FORMAT_VERSION} [{}]",
            self.cli_name, self.shell
        )
    }

    /// End line.
    pub fn end_line(&self) -> String {
        format!("# END {} completion [{}]", self.cli_name, self.shell)
    }

    /// Frame `body` between the markers. The result ends with a newline.
    pub fn wrap(&self, body: &str) -> String {
        let body = body.trim_end_matches(['\n', '\r']);
        let mut out = String::with_capacity(body.len() + 96);
        out.push_str(&self.begin_line());
        out.push('\n');
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }
        out.push_str(&self.end_line());
        out.push('\n');
        out
    }

    /// Format version if `line` is a begin marker of ours.
    pub fn parse_begin(&self, line: &str) -> Option<u32> {
        self.begin
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|version| version.as_str().parse().ok())
    }

    /// Whether `line` is an end marker of ours.
    pub fn is_end(&self, line: &str) -> bool {
        self.end.is_match(line)
    }

    /// Every block of ours in `content`, in file order.
    ///
    /// A begin marker without a matching end marker (or followed by another
    /// begin marker first) is reported as [`Error::MalformedBlock`] against
    /// `path`; callers refuse to edit such a file.
    pub fn find_blocks(&self, content: &str, path: &Path) -> Result<Vec<BlockSpan>> {
        let lines: Vec<&str> = content.lines().collect();
        let mut spans = Vec::new();
        let mut idx = 0;
        while idx < lines.len() {
            let Some(version) = self.parse_begin(lines[idx]) else {
                idx += 1;
                continue;
            };
            let begin = idx;
            let mut end = None;
            for (offset, line) in lines[begin + 1..].iter().enumerate() {
                if self.is_end(line) {
                    end = Some(begin + 1 + offset);
                    break;
                }
                if self.parse_begin(line).is_some() {
                    break;
                }
            }
            let Some(end) = end else {
                return Err(Error::MalformedBlock {
                    path: path.to_path_buf(),
                    line: begin + 1,
                    reason: format!("missing '{}'", self.end_line()),
                });
            };
            spans.push(BlockSpan {
                begin,
                end,
                version,
            });
            idx = end + 1;
        }
        Ok(spans)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn marker() -> CompletionMarker {
        CompletionMarker::new("compline", ShellKind::Bash).unwrap()
    }

    #[test]
    fn test_wrap_frames_body() {
        let block = marker().wrap("echo hi\n\n");
        assert_eq!(
            block,
            "# BEGIN compline completion v1 [bash]\necho hi\n# END compline completion [bash]\n"
        );
    }

    #[test]
    fn test_find_blocks_reports_spans_and_versions() {
        let content = "a\n# BEGIN compline completion v1 [bash]\nx\n# END compline completion [bash]\nb\n# BEGIN compline completion v0 [bash]\n# END compline completion [bash]\n";
        let spans = marker().find_blocks(content, Path::new("rc")).unwrap();
        assert_eq!(
            spans,
            vec![
                BlockSpan { begin: 1, end: 3, version: 1 },
                BlockSpan { begin: 5, end: 6, version: 0 },
            ]
        );
    }

    #[test]
    fn test_other_shells_and_clis_are_ignored() {
        let content = "# BEGIN compline completion v1 [zsh]\n# END compline completion [zsh]\n# BEGIN other completion v1 [bash]\n";
        assert!(marker().find_blocks(content, Path::new("rc")).unwrap().is_empty());
    }

    #[test]
    fn test_cli_name_is_matched_literally() {
        let marker = CompletionMarker::new("my.cli", ShellKind::Bash).unwrap();
        assert!(marker.parse_begin("# BEGIN myxcli completion v1 [bash]").is_none());
        assert_eq!(marker.parse_begin("# BEGIN my.cli completion v1 [bash]"), Some(1));
    }

    #[test]
    fn test_unterminated_block_is_malformed() {
        let content = "x\n# BEGIN compline completion v1 [bash]\nstuff\n";
        let err = marker().find_blocks(content, Path::new("rc")).unwrap_err();
        assert!(matches!(err, Error::MalformedBlock { line: 2, .. }));
    }

    #[test]
    fn test_nested_begin_is_malformed() {
        let content = "# BEGIN compline completion v1 [bash]\n# BEGIN compline completion v1 [bash]\n# END compline completion [bash]\n";
        let err = marker().find_blocks(content, Path::new("rc")).unwrap_err();
        assert!(matches!(err, Error::MalformedBlock { line: 1, .. }));
    }

    #[test]
    fn test_crlf_lines_match() {
        let content = "# BEGIN compline completion v1 [bash]\r\nx\r\n# END compline completion [bash]\r\n";
        assert_eq!(marker().find_blocks(content, Path::new("rc")).unwrap().len(), 1);
    }
}
