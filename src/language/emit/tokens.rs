use std::{
    collections::{HashMap, HashSet},
    io,
};

/// Keywords, operators and punctuation of the host language. Their spelling
/// comes from a [`TokenTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostToken {
    Declare,
    Local,
    In,
    End,
    Fun,
    Proc,
    Class,
    From,
    Attr,
    Meth,
    Functor,
    Import,
    Export,
    Define,
    If,
    Then,
    ElseIf,
    Else,
    Case,
    Of,
    ClauseSeparator,
    For,
    Do,
    Skip,
    SelfObject,
    New,
    NewCell,
    Append,
    Not,
    Deref,
    CellAssign,
    Bind,
    Placeholder,
    Unbound,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
    DotDot,
    Semi,
    Pipe,
    Plus,
    Minus,
    Times,
    FloatDiv,
    IntDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Negate,
    AndThen,
    OrElse,
    True,
    False,
    Nil,
    Unit,
    CharPrefix,
}

const OZ: &[(HostToken, &str)] = &[
    (HostToken::Declare, "declare"),
    (HostToken::Local, "local"),
    (HostToken::In, "in"),
    (HostToken::End, "end"),
    (HostToken::Fun, "fun"),
    (HostToken::Proc, "proc"),
    (HostToken::Class, "class"),
    (HostToken::From, "from"),
    (HostToken::Attr, "attr"),
    (HostToken::Meth, "meth"),
    (HostToken::Functor, "functor"),
    (HostToken::Import, "import"),
    (HostToken::Export, "export"),
    (HostToken::Define, "define"),
    (HostToken::If, "if"),
    (HostToken::Then, "then"),
    (HostToken::ElseIf, "elseif"),
    (HostToken::Else, "else"),
    (HostToken::Case, "case"),
    (HostToken::Of, "of"),
    (HostToken::ClauseSeparator, "[]"),
    (HostToken::For, "for"),
    (HostToken::Do, "do"),
    (HostToken::Skip, "skip"),
    (HostToken::SelfObject, "self"),
    (HostToken::New, "New"),
    (HostToken::NewCell, "NewCell"),
    (HostToken::Append, "Append"),
    (HostToken::Not, "Not"),
    (HostToken::Deref, "@"),
    (HostToken::CellAssign, ":="),
    (HostToken::Bind, "="),
    (HostToken::Placeholder, "$"),
    (HostToken::Unbound, "_"),
    (HostToken::LBrace, "{"),
    (HostToken::RBrace, "}"),
    (HostToken::LParen, "("),
    (HostToken::RParen, ")"),
    (HostToken::LBracket, "["),
    (HostToken::RBracket, "]"),
    (HostToken::Colon, ":"),
    (HostToken::Comma, ","),
    (HostToken::Dot, "."),
    (HostToken::DotDot, ".."),
    (HostToken::Semi, ";"),
    (HostToken::Pipe, "|"),
    (HostToken::Plus, "+"),
    (HostToken::Minus, "-"),
    (HostToken::Times, "*"),
    (HostToken::FloatDiv, "/"),
    (HostToken::IntDiv, "div"),
    (HostToken::Mod, "mod"),
    (HostToken::Eq, "=="),
    (HostToken::Ne, "\\="),
    (HostToken::Lt, "<"),
    (HostToken::Le, "=<"),
    (HostToken::Gt, ">"),
    (HostToken::Ge, ">="),
    (HostToken::Negate, "~"),
    (HostToken::AndThen, "andthen"),
    (HostToken::OrElse, "orelse"),
    (HostToken::True, "true"),
    (HostToken::False, "false"),
    (HostToken::Nil, "nil"),
    (HostToken::Unit, "unit"),
    (HostToken::CharPrefix, "&"),
];

/// Oz words an atom may not be spelled as without quotes.
const OZ_RESERVED: &[&str] = &[
    "andthen", "at", "attr", "break", "case", "catch", "choice", "class", "collect", "cond",
    "continue", "declare", "default", "define", "dis", "div", "do", "else", "elsecase", "elseif",
    "elseof", "end", "export", "fail", "false", "feat", "finally", "for", "from", "fun",
    "functor", "if", "import", "in", "lazy", "local", "lock", "meth", "mod", "not", "of", "or",
    "orelse", "prepare", "proc", "prop", "raise", "require", "return", "self", "skip", "then",
    "thread", "true", "try", "unit",
];

/// Host spelling of every [`HostToken`], plus the host's reserved words.
#[derive(Clone, Debug)]
pub struct TokenTable {
    images: HashMap<HostToken, String>,
    reserved: HashSet<String>,
}

impl TokenTable {
    /// Spellings for Mozart/Oz.
    pub fn oz() -> Self {
        Self::from_pairs(OZ.iter().map(|(token, image)| (*token, *image)))
            .with_reserved(OZ_RESERVED.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (HostToken, &'a str)>) -> Self {
        Self {
            images: pairs
                .into_iter()
                .map(|(token, image)| (token, image.to_string()))
                .collect(),
            reserved: HashSet::new(),
        }
    }

    /// Replaces one spelling. A reserved spelling hands its reservation to
    /// the new one.
    pub fn with(mut self, token: HostToken, image: impl Into<String>) -> Self {
        let image = image.into();
        if let Some(old) = self.images.insert(token, image.clone()) {
            if self.reserved.remove(&old) {
                self.reserved.insert(image);
            }
        }
        self
    }

    pub fn with_reserved<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.reserved.extend(words.into_iter().map(str::to_string));
        self
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved.contains(word)
    }

    pub fn image(&self, token: HostToken) -> io::Result<&str> {
        self.images.get(&token).map(String::as_str).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no host spelling for {token:?}"),
            )
        })
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::oz()
    }
}
