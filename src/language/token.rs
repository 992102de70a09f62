use crate::language::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),
    Char(char),
    Atom(String),

    Declare,
    Local,
    In,
    End,
    Val,
    Var,
    Fun,
    Proc,
    Class,
    Functor,
    Meth,
    Extends,
    Attr,
    Prop,
    Feat,
    Import,
    Export,
    Define,
    If,
    Then,
    ElseIf,
    Else,
    Case,
    Of,
    When,
    For,
    Do,
    Skip,
    This,
    Super,
    New,
    True,
    False,
    Nil,
    Unit,
    AndThen,
    OrElse,
    Not,
    Mod,

    Underscore,
    Dollar,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Eq,
    PlusEq,
    MinusEq,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Pipe,
    Dot,
    DotDot,
    Comma,
    Colon,
    Semi,
    FatArrow, // =>

    Eof,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "declare" => TokenKind::Declare,
            "local" => TokenKind::Local,
            "in" => TokenKind::In,
            "end" => TokenKind::End,
            "val" => TokenKind::Val,
            "var" => TokenKind::Var,
            "fun" => TokenKind::Fun,
            "proc" => TokenKind::Proc,
            "class" => TokenKind::Class,
            "functor" => TokenKind::Functor,
            "meth" => TokenKind::Meth,
            "extends" => TokenKind::Extends,
            "attr" => TokenKind::Attr,
            "prop" => TokenKind::Prop,
            "feat" => TokenKind::Feat,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "define" => TokenKind::Define,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "elseif" => TokenKind::ElseIf,
            "else" => TokenKind::Else,
            "case" => TokenKind::Case,
            "of" => TokenKind::Of,
            "when" => TokenKind::When,
            "for" => TokenKind::For,
            "do" => TokenKind::Do,
            "skip" => TokenKind::Skip,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "new" => TokenKind::New,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            "unit" => TokenKind::Unit,
            "andthen" => TokenKind::AndThen,
            "orelse" => TokenKind::OrElse,
            "not" => TokenKind::Not,
            "mod" => TokenKind::Mod,
            "_" => TokenKind::Underscore,
            _ => return None,
        };
        Some(kind)
    }

    /// Tokens that open a declaration inside a body.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self,
            TokenKind::Val
                | TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Proc
                | TokenKind::Class
                | TokenKind::Functor
                | TokenKind::Export
        )
    }

    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{name}`"),
            TokenKind::Integer(value) => format!("integer `{value}`"),
            TokenKind::Float(value) => format!("float `{value}`"),
            TokenKind::String(_) => "string literal".into(),
            TokenKind::Char(_) => "character literal".into(),
            TokenKind::Atom(name) => format!("atom `#{name}`"),
            TokenKind::Eof => "end of input".into(),
            other => match other.spelling() {
                Some(text) => format!("`{text}`"),
                None => format!("{other:?}"),
            },
        }
    }

    /// Source text of keywords and punctuation.
    pub fn spelling(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Declare => "declare",
            TokenKind::Local => "local",
            TokenKind::In => "in",
            TokenKind::End => "end",
            TokenKind::Val => "val",
            TokenKind::Var => "var",
            TokenKind::Fun => "fun",
            TokenKind::Proc => "proc",
            TokenKind::Class => "class",
            TokenKind::Functor => "functor",
            TokenKind::Meth => "meth",
            TokenKind::Extends => "extends",
            TokenKind::Attr => "attr",
            TokenKind::Prop => "prop",
            TokenKind::Feat => "feat",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Define => "define",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::ElseIf => "elseif",
            TokenKind::Else => "else",
            TokenKind::Case => "case",
            TokenKind::Of => "of",
            TokenKind::When => "when",
            TokenKind::For => "for",
            TokenKind::Do => "do",
            TokenKind::Skip => "skip",
            TokenKind::This => "this",
            TokenKind::Super => "super",
            TokenKind::New => "new",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            TokenKind::Unit => "unit",
            TokenKind::AndThen => "andthen",
            TokenKind::OrElse => "orelse",
            TokenKind::Not => "not",
            TokenKind::Mod => "mod",
            TokenKind::Underscore => "_",
            TokenKind::Dollar => "$",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Pipe => "|",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semi => ";",
            TokenKind::FatArrow => "=>",
            _ => return None,
        };
        Some(text)
    }
}
