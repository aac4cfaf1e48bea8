//! Indentation-aware line buffer shared by the dialect builders.

/// Accumulates script lines with a fixed indentation unit.
pub struct ScriptWriter {
    buf: String,
    depth: usize,
    unit: &'static str,
}

impl ScriptWriter {
    /// Start an empty script indented with `unit` per level.
    pub const fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Append one line at the current depth. Empty lines carry no indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(self.unit);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Append an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Write `open`, the body one level deeper, then `close`.
    pub fn block(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.nested(body);
        self.line(close);
    }

    /// Write the body one level deeper.
    pub fn nested(&mut self, body: impl FnOnce(&mut Self)) {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    /// The finished script.
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indents_body() {
        let mut w = ScriptWriter::new("  ");
        w.block("f() {", "}", |w| {
            w.line("echo hi");
            w.blank();
            w.block("if x; then", "fi", |w| w.line("y"));
        });
        assert_eq!(w.finish(), "f() {\n  echo hi\n\n  if x; then\n    y\n  fi\n}\n");
    }
}
