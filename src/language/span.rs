use miette::SourceSpan;

/// Byte range into the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_source_span(self) -> SourceSpan {
        (self.start, self.len()).into()
    }
}

/// Maps byte offsets to 1-based line numbers and back.
#[derive(Clone, Debug)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                starts.push(offset + 1);
            }
        }
        Self {
            starts,
            len: source.len(),
        }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    /// Span covering `line` without its trailing newline. Lines past the end
    /// collapse to an empty span at the end of the source.
    pub fn line_span(&self, line: usize) -> Span {
        if line == 0 || line > self.starts.len() {
            return Span::new(self.len, self.len);
        }
        let start = self.starts[line - 1];
        let end = self
            .starts
            .get(line)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(self.len);
        Span::new(start, end.max(start))
    }
}
