use crate::language::{
    diagnostics::{Diagnostic as SemanticEntry, Severity},
    errors::SyntaxError,
    lexer::LexError,
    span::{LineIndex, Span},
};
use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceCode, SourceSpan};
use std::{fmt, path::Path};
use thiserror::Error;

/// One input file, shared by every report about it.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: String,
    source: String,
    lines: LineIndex,
}

impl SourceFile {
    pub fn new(path: &Path, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            name: path.display().to_string(),
            lines: LineIndex::new(&source),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn named(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.source.clone())
    }

    fn line_span(&self, line: usize) -> Span {
        self.lines.line_span(line)
    }
}

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{headline}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    headline: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(file: &SourceFile, err: &SyntaxError) -> Self {
        Self {
            src: file.named(),
            span: err.to_source_span(),
            help: err.help.clone(),
            headline: format!("{}:{}: {}", file.name(), err.line, err.message),
            label: err.label.clone(),
        }
    }

    pub fn from_lex_error(file: &SourceFile, err: &LexError) -> Self {
        Self {
            src: file.named(),
            span: err.span.to_source_span(),
            help: None,
            headline: format!("{}:{}: {}", file.name(), err.line, err.message),
            label: err.message.clone(),
        }
    }
}

/// A resolution diagnostic or a malformed-tree report, pointing at a whole
/// source line.
#[derive(Debug, Clone)]
pub struct LineDiagnostic {
    src: NamedSource<String>,
    span: SourceSpan,
    severity: Severity,
    headline: String,
    label: String,
}

impl LineDiagnostic {
    pub fn new(file: &SourceFile, severity: Severity, line: usize, message: &str) -> Self {
        Self {
            src: file.named(),
            span: file.line_span(line).to_source_span(),
            severity,
            headline: format!("{}:{line}: {message}", file.name()),
            label: severity.to_string(),
        }
    }

    pub fn from_entry(file: &SourceFile, entry: &SemanticEntry) -> Self {
        Self::new(file, entry.severity, entry.line, &entry.message)
    }
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline)
    }
}

impl std::error::Error for LineDiagnostic {}

impl Diagnostic for LineDiagnostic {
    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }
}

pub fn emit_syntax_errors(file: &SourceFile, errors: &[SyntaxError]) {
    for err in errors {
        eprintln!("{:?}", Report::new(SyntaxDiagnostic::from_error(file, err)));
    }
}

pub fn emit_lex_errors(file: &SourceFile, errors: &[LexError]) {
    for err in errors {
        eprintln!("{:?}", Report::new(SyntaxDiagnostic::from_lex_error(file, err)));
    }
}

pub fn emit_semantic(file: &SourceFile, entries: &[SemanticEntry]) {
    for entry in entries {
        eprintln!("{:?}", Report::new(LineDiagnostic::from_entry(file, entry)));
    }
}

pub fn emit_line_error(file: &SourceFile, line: usize, message: &str) {
    let diagnostic = LineDiagnostic::new(file, Severity::Error, line, message);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> SourceFile {
        SourceFile::new(Path::new("demo.lumo"), "val x = 1\n{Show y}\n")
    }

    #[test]
    fn headlines_name_file_and_line() {
        let entry = SemanticEntry {
            severity: Severity::Error,
            line: 2,
            message: "undefined variable y".to_string(),
        };
        let msg = LineDiagnostic::from_entry(&file(), &entry).to_string();
        insta::assert_snapshot!(msg, @"demo.lumo:2: undefined variable y");
    }

    #[test]
    fn warnings_keep_their_severity() {
        let diagnostic = LineDiagnostic::new(&file(), Severity::Warning, 1, "branch type mismatch");
        assert_eq!(diagnostic.severity(), Some(miette::Severity::Warning));
        let label = diagnostic.labels().and_then(|mut labels| labels.next());
        let label = label.expect("one label");
        assert_eq!(label.offset(), 0);
        assert_eq!(label.len(), 9);
    }

    #[test]
    fn syntax_errors_carry_help() {
        let err = SyntaxError::new("expected `end`", Span::new(10, 11), 2).with_help("close it");
        let diagnostic = SyntaxDiagnostic::from_error(&file(), &err);
        assert_eq!(diagnostic.to_string(), "demo.lumo:2: expected `end`");
        assert_eq!(diagnostic.help().map(|help| help.to_string()).as_deref(), Some("close it"));
    }
}
