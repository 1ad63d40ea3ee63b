//! Indentation-aware text sink.
//!
//! Each output stream owns its own printer, so indentation opened while
//! rendering one stream can never leak into another.

#[derive(Debug)]
pub struct Printer {
    buf: String,
    depth: usize,
    unit: &'static str,
}

impl Printer {
    pub fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Writes one indented line; an empty `text` writes a bare newline.
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

    /// Writes each line of `text` at the current depth.
    pub fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Appends `text` verbatim, ignoring the current depth.
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn outdent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        let mut p = Printer::new("    ");
        p.line("def f():");
        p.indent();
        p.line("if x:");
        p.indent();
        p.lines("a\nb");
        p.outdent();
        p.line("");
        p.outdent();
        p.outdent();
        p.line("done");
        assert_eq!(p.depth(), 0);
        assert_eq!(p.finish(), "def f():\n    if x:\n        a\n        b\n\ndone\n");
    }
}
