//! Pure text edits on profile contents.
//!
//! Lines keep their original endings; only the lines belonging to a block
//! (plus at most one separating blank line) are ever added or removed, so
//! `remove(append(c, b)) == c` for any content `c` without trailing blank
//! lines.

use super::marker::BlockSpan;

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Append `block` after the existing content, separated by one blank line.
///
/// Trailing blank lines of `content` are dropped first so repeated
/// install/uninstall cycles do not accumulate whitespace.
pub fn append_block(content: &str, block: &str) -> String {
    let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
    while lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }
    if lines.is_empty() {
        return block.to_string();
    }

    let mut out = lines.concat();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(block);
    out
}

/// Replace the lines of `span` with `block`.
pub fn replace_block(content: &str, span: BlockSpan, block: &str) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(&lines[..span.begin].concat());
    out.push_str(block);
    if let Some(rest) = lines.get(span.end + 1..) {
        out.push_str(&rest.concat());
    }
    out
}

/// Remove every span, collapsing the blank line that separated each block
/// from the preceding content.
///
/// `spans` must be in file order and non-overlapping, as returned by
/// [`super::CompletionMarker::find_blocks`].
pub fn remove_blocks(content: &str, spans: &[BlockSpan]) -> String {
    let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
    for span in spans.iter().rev() {
        let end = (span.end + 1).min(lines.len());
        lines.drain(span.begin..end);

        let next_is_blank_or_eof = lines.get(span.begin).is_none_or(|line| is_blank(line));
        if span.begin > 0 {
            if is_blank(lines[span.begin - 1]) && next_is_blank_or_eof {
                lines.remove(span.begin - 1);
            }
        } else if span.begin < lines.len() && is_blank(lines[span.begin]) {
            lines.remove(span.begin);
        }
    }
    lines.concat()
}
