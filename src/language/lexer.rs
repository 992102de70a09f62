use crate::language::{
    span::{LineIndex, Span},
    token::{Token, TokenKind},
};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace1, none_of},
    combinator::{map, map_res, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

#[derive(Clone, Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
    pub line: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut remaining = source;
    let mut offset = 0usize;

    loop {
        let skipped = skip_trivia(remaining);
        offset += remaining.len() - skipped.len();
        remaining = skipped;
        if remaining.is_empty() {
            break;
        }

        match token(remaining) {
            Ok((rest, kind)) => {
                let consumed = remaining.len() - rest.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(offset, offset + consumed),
                    line: lines.line_of(offset),
                });
                remaining = rest;
                offset += consumed;
            }
            Err(_) => {
                let mut chars = remaining.chars();
                let ch = chars.next().unwrap_or_default();
                let line = lines.line_of(offset);
                if ch == '"' {
                    errors.push(LexError {
                        message: "unterminated string literal".into(),
                        span: Span::new(offset, source.len()),
                        line,
                    });
                    break;
                }
                if let Ok((rest, digits)) = digit1::<&str, nom::error::Error<&str>>(remaining) {
                    errors.push(LexError {
                        message: "integer literal out of range".into(),
                        span: Span::new(offset, offset + digits.len()),
                        line,
                    });
                    offset += digits.len();
                    remaining = rest;
                    continue;
                }
                errors.push(LexError {
                    message: format!("unexpected character `{ch}`"),
                    span: Span::new(offset, offset + ch.len_utf8()),
                    line,
                });
                offset += ch.len_utf8();
                remaining = chars.as_str();
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        line: lines.line_of(source.len()),
    });

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

fn skip_trivia(mut input: &str) -> &str {
    loop {
        if let Ok((rest, _)) = multispace1::<&str, nom::error::Error<&str>>(input) {
            input = rest;
            continue;
        }
        if let Ok((rest, _)) = line_comment(input) {
            input = rest;
            continue;
        }
        return input;
    }
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    preceded(char('%'), take_till(|c| c == '\n'))(input)
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        number,
        string_literal,
        char_literal,
        atom,
        word,
        punctuation,
    ))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn word(input: &str) -> IResult<&str, TokenKind> {
    map(identifier, |text: &str| {
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    })(input)
}

fn atom(input: &str) -> IResult<&str, TokenKind> {
    map(preceded(char('#'), identifier), |text: &str| {
        TokenKind::Atom(text.to_string())
    })(input)
}

fn number(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map_res(recognize(pair(digit1, pair(char('.'), digit1))), |text: &str| {
            text.parse::<f64>().map(TokenKind::Float)
        }),
        map_res(digit1, |text: &str| text.parse::<i64>().map(TokenKind::Integer)),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, TokenKind> {
    let (mut rest, _) = char('"')(input)?;
    let mut text = String::new();
    loop {
        let (next, ch) = anychar(rest)?;
        match ch {
            '"' => return Ok((next, TokenKind::String(text))),
            '\\' => {
                let (after, escaped) = anychar(next)?;
                text.push(unescape(escaped));
                rest = after;
            }
            other => {
                text.push(other);
                rest = next;
            }
        }
    }
}

fn char_literal(input: &str) -> IResult<&str, TokenKind> {
    map(
        delimited(
            char('\''),
            alt((map(preceded(char('\\'), anychar), unescape), none_of("'\\"))),
            char('\''),
        ),
        TokenKind::Char,
    )(input)
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        '0' => '\0',
        other => other,
    }
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        alt((
            value(TokenKind::DotDot, tag("..")),
            value(TokenKind::EqEq, tag("==")),
            value(TokenKind::BangEq, tag("!=")),
            value(TokenKind::LtEq, tag("<=")),
            value(TokenKind::GtEq, tag(">=")),
            value(TokenKind::PlusEq, tag("+=")),
            value(TokenKind::MinusEq, tag("-=")),
            value(TokenKind::FatArrow, tag("=>")),
        )),
        alt((
            value(TokenKind::LBrace, char('{')),
            value(TokenKind::RBrace, char('}')),
            value(TokenKind::LParen, char('(')),
            value(TokenKind::RParen, char(')')),
            value(TokenKind::LBracket, char('[')),
            value(TokenKind::RBracket, char(']')),
            value(TokenKind::Eq, char('=')),
            value(TokenKind::Lt, char('<')),
            value(TokenKind::Gt, char('>')),
            value(TokenKind::Plus, char('+')),
            value(TokenKind::Minus, char('-')),
            value(TokenKind::Star, char('*')),
            value(TokenKind::Slash, char('/')),
            value(TokenKind::Pipe, char('|')),
            value(TokenKind::Dot, char('.')),
            value(TokenKind::Comma, char(',')),
            value(TokenKind::Colon, char(':')),
            value(TokenKind::Semi, char(';')),
            value(TokenKind::Dollar, char('$')),
        )),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn keywords_identifiers_and_literals() {
        assert_eq!(
            kinds("val x = 1 + 2.5"),
            vec![
                TokenKind::Val,
                TokenKind::Identifier("x".into()),
                TokenKind::Eq,
                TokenKind::Integer(1),
                TokenKind::Plus,
                TokenKind::Float(2.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_is_not_a_float() {
        assert_eq!(
            kinds("1..10"),
            vec![
                TokenKind::Integer(1),
                TokenKind::DotDot,
                TokenKind::Integer(10),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_chars_and_atoms() {
        assert_eq!(
            kinds(r#""a\"b\n" 'c' '\n' #ok"#),
            vec![
                TokenKind::String("a\"b\n".into()),
                TokenKind::Char('c'),
                TokenKind::Char('\n'),
                TokenKind::Atom("ok".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_tracked() {
        let tokens = tokenize("% header\nval x = 1 % trailing\n{Show x}").expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Val);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[4].kind, TokenKind::LBrace);
        assert_eq!(tokens[4].line, 3);
    }

    #[test]
    fn underscore_alone_is_a_wildcard() {
        assert_eq!(
            kinds("_ _tmp"),
            vec![
                TokenKind::Underscore,
                TokenKind::Identifier("_tmp".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn compound_operators_win_over_single_characters() {
        assert_eq!(
            kinds("x += 1 y -= 2 a => b != c <= d"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::PlusEq,
                TokenKind::Integer(1),
                TokenKind::Identifier("y".into()),
                TokenKind::MinusEq,
                TokenKind::Integer(2),
                TokenKind::Identifier("a".into()),
                TokenKind::FatArrow,
                TokenKind::Identifier("b".into()),
                TokenKind::BangEq,
                TokenKind::Identifier("c".into()),
                TokenKind::LtEq,
                TokenKind::Identifier("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unexpected_characters_are_collected() {
        let errors = tokenize("val x = 1 ? 2 ~").expect_err("should fail");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "unexpected character `?`");
        assert_eq!(errors[1].span, Span::new(14, 15));
    }

    #[test]
    fn oversized_integer_is_one_error() {
        let errors = tokenize("val n = 99999999999999999999 + 1").expect_err("should fail");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "integer literal out of range");
        assert_eq!(errors[0].span, Span::new(8, 28));
    }

    #[test]
    fn unterminated_string_stops_lexing() {
        let errors = tokenize("val s = \"open").expect_err("should fail");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unterminated string literal");
    }
}
