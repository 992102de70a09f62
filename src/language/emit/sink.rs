use crate::language::emit::tokens::{HostToken, TokenTable};
use std::io::{self, Write};

pub const INDENT_WIDTH: usize = 2;

/// Token sink for generated host text. Spacing and line breaks are always
/// explicit; indentation is written at the first write of each line.
pub struct Emitter<'t, W: Write> {
    out: W,
    table: &'t TokenTable,
    depth: usize,
    line_start: bool,
}

impl<'t, W: Write> Emitter<'t, W> {
    pub fn new(out: W, table: &'t TokenTable) -> Self {
        Self {
            out,
            table,
            depth: 0,
            line_start: true,
        }
    }

    pub fn token(&mut self, token: HostToken) -> io::Result<()> {
        let table = self.table;
        let image = table.image(token)?;
        self.text(image)
    }

    /// Identifiers, literals and other free text.
    pub fn text(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.line_start {
            write!(self.out, "{:width$}", "", width = self.depth * INDENT_WIDTH)?;
            self.line_start = false;
        }
        self.out.write_all(text.as_bytes())
    }

    pub fn space(&mut self) -> io::Result<()> {
        self.text(" ")
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.line_start = true;
        self.out.write_all(b"\n")
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Never goes below column zero.
    pub fn outdent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn table(&self) -> &'t TokenTable {
        self.table
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Emitter<'_, Vec<u8>>) -> io::Result<()>) -> String {
        let table = TokenTable::oz();
        let mut emitter = Emitter::new(Vec::new(), &table);
        f(&mut emitter).expect("emit");
        String::from_utf8(emitter.finish().expect("finish")).expect("utf8")
    }

    #[test]
    fn indentation_is_written_lazily() {
        let text = render(|out| {
            out.token(HostToken::Local)?;
            out.newline()?;
            out.indent();
            out.text("X")?;
            out.newline()?;
            out.newline()?;
            out.outdent();
            out.token(HostToken::End)
        });
        assert_eq!(text, "local\n  X\n\nend");
    }

    #[test]
    fn outdent_floors_at_zero() {
        let text = render(|out| {
            out.outdent();
            out.outdent();
            out.indent();
            out.text("a")
        });
        assert_eq!(text, "  a");
    }

    #[test]
    fn spaces_are_never_inferred() {
        let text = render(|out| {
            out.token(HostToken::Skip)?;
            out.token(HostToken::Skip)?;
            out.space()?;
            out.token(HostToken::Skip)
        });
        assert_eq!(text, "skipskip skip");
    }
}
