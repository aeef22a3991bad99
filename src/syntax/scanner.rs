//! Token scanner for JavaScript-family source text
//!
//! Produces a flat token stream that keeps every byte of the input, so the
//! parser can hand untouched spans back out verbatim. Literal boundaries come
//! from logos; the driver in [`scan_script`] adds the context logos cannot
//! see: whether a `/` starts a regular expression and whether a `<` opens a
//! JSX element. JSX is scanned with its own small token sets, so child text
//! such as `Don't` or `https://x` never turns into strings or comments.

use std::ops::Range;
use std::sync::LazyLock;

use logos::{Lexer, Logos};
use regex::Regex;
use thiserror::Error;

use crate::error::SyntaxError;

/// Why a scan stopped early.
#[derive(Error, Debug, Clone, PartialEq, Default)]
pub enum ScanError {
    #[default]
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated template literal")]
    UnterminatedTemplate,
    #[error("unexpected end of input")]
    UnexpectedEnd,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ScanError)]
#[logos(subpattern space = r"[\t\n\x0B\x0C\r \u{85}\u{A0}\u{1680}\u{2000}-\u{200A}\u{2028}\u{2029}\u{202F}\u{205F}\u{3000}\u{FEFF}]")]
#[logos(subpattern id_start = r"[A-Za-z_$\u{80}-\u{84}\u{86}-\u{9F}\u{A1}-\u{167F}\u{1681}-\u{1FFF}\u{200B}-\u{2027}\u{202A}-\u{202E}\u{2030}-\u{205E}\u{2060}-\u{2FFF}\u{3001}-\u{FEFE}\u{FF00}-\u{10FFFF}]")]
pub enum TokenKind {
    #[regex(r"(?&space)+")]
    Whitespace,

    #[regex(r"//[^\n\r]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    /// `#!...` on the first line
    Hashbang,

    #[regex(r"(?&id_start)((?&id_start)|[0-9])*")]
    Ident,

    #[token("\"", string)]
    #[token("'", string)]
    Str,

    #[token("`", template)]
    Template,

    /// Set by the driver when a `/` opens a regular expression
    Regex,

    #[regex(r"[0-9][0-9A-Za-z_.]*", number)]
    #[regex(r"\.[0-9][0-9A-Za-z_.]*", number)]
    Number,

    /// Tag or attribute name inside a JSX tag
    JsxName,

    /// Text between JSX tags
    JsxText,

    #[regex(r"[!#%&()*+,\-./:;<=>?@\[\\\]^{|}~\x00-\x08\x0E-\x1F\x7F]")]
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self {
            kind,
            start: span.start,
            end: span.end,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// True for a punctuation token consisting of exactly `c`.
    pub fn is_punct(&self, source: &str, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text(source).starts_with(c)
    }

    pub fn is_ident(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == word
    }
}

/// Keywords after which a `/` starts a regular expression.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "extends",
];

/// Regex body and flags after the opening `/`, all on one line.
static REGEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[^\\/\[\n\r\u{2028}\u{2029}]|\\[^\n\r\u{2028}\u{2029}]|\[(?:[^\]\\\n\r\u{2028}\u{2029}]|\\[^\n\r\u{2028}\u{2029}])*\])+/[0-9A-Za-z_$]*",
    )
    .expect("REGEX_LITERAL regex is invalid")
});

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut start = 0;

    if source.starts_with("#!") {
        let end = source.find(['\n', '\r']).unwrap_or(source.len());
        tokens.push(Token::new(TokenKind::Hashbang, 0..end));
        start = end;
    }

    scan_script(source, start, Until::EndOfInput, &mut tokens)
        .map_err(|(offset, e)| SyntaxError::at(source, offset, e.to_string()))?;
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Until {
    EndOfInput,
    /// The `}` closing a `${` substitution or a JSX expression container
    ClosingBrace,
}

/// Scan script tokens from `start`, returning the offset where scanning stopped.
///
/// With [`Until::ClosingBrace`] the closing `}` is pushed and scanning stops
/// right after it. Errors carry the byte offset they were found at.
fn scan_script(
    src: &str,
    start: usize,
    until: Until,
    out: &mut Vec<Token>,
) -> Result<usize, (usize, ScanError)> {
    let mut lex = TokenKind::lexer(src);
    lex.bump(start);

    let mut depth = 0usize;
    let mut expression_start = true;

    while let Some(result) = lex.next() {
        let span = lex.span();
        let mut kind = result.map_err(|e| (span.start, e))?;

        if kind == TokenKind::Punct {
            match lex.slice() {
                "/" if expression_start => {
                    if let Some(m) = REGEX_LITERAL.find(lex.remainder()) {
                        lex.bump(m.end());
                        kind = TokenKind::Regex;
                    }
                }
                "<" if expression_start && opens_jsx(lex.remainder()) => {
                    let mut jsx = Vec::new();
                    if let Some(end) = scan_jsx_element(src, span.start, &mut jsx) {
                        out.append(&mut jsx);
                        lex.bump(end - span.end);
                        expression_start = false;
                        continue;
                    }
                }
                "{" => depth += 1,
                "}" if depth > 0 => depth -= 1,
                "}" if until == Until::ClosingBrace => {
                    out.push(Token::new(kind, span.clone()));
                    return Ok(span.end);
                }
                _ => {}
            }
        }

        out.push(Token::new(kind, lex.span()));
        expression_start = match kind {
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => {
                expression_start
            }
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&lex.slice()),
            // `<` is a comparison here, so `</` can never open a regex
            TokenKind::Punct => !matches!(lex.slice(), ")" | "]" | "}" | "<"),
            _ => false,
        };
    }

    match until {
        Until::EndOfInput => Ok(src.len()),
        Until::ClosingBrace => Err((src.len(), ScanError::UnexpectedEnd)),
    }
}

fn opens_jsx(after_angle: &str) -> bool {
    after_angle
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || matches!(c, '_' | '$' | '>'))
}

fn block_comment_len(rest: &str) -> Result<usize, ScanError> {
    rest.find("*/")
        .map(|end| end + 2)
        .ok_or(ScanError::UnterminatedComment)
}

fn block_comment(lex: &mut Lexer<TokenKind>) -> Result<(), ScanError> {
    let len = block_comment_len(lex.remainder())?;
    lex.bump(len);
    Ok(())
}

/// Length of a string body plus its closing quote, if it closes on this line.
fn string_len(rest: &str, quote: char) -> Option<usize> {
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                // Escaped line breaks continue the string.
                if let Some((_, '\r')) = chars.next() {
                    chars.next_if(|&(_, c)| c == '\n');
                }
            }
            '\n' | '\r' => return None,
            c if c == quote => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn string(lex: &mut Lexer<TokenKind>) -> Result<(), ScanError> {
    let quote = if lex.slice() == "'" { '\'' } else { '"' };
    let len = string_len(lex.remainder(), quote).ok_or(ScanError::UnterminatedString)?;
    lex.bump(len);
    Ok(())
}

/// End offset of the template literal whose body starts at `pos`.
fn template_end(src: &str, mut pos: usize) -> Result<usize, ScanError> {
    loop {
        let i = pos
            + src[pos..]
                .find(['\\', '`', '$'])
                .ok_or(ScanError::UnterminatedTemplate)?;
        let rest = &src[i + 1..];
        match &src[i..=i] {
            "\\" => {
                let escaped = rest
                    .chars()
                    .next()
                    .ok_or(ScanError::UnterminatedTemplate)?;
                pos = i + 1 + escaped.len_utf8();
            }
            "`" => return Ok(i + 1),
            _ if rest.starts_with('{') => {
                pos = scan_script(src, i + 2, Until::ClosingBrace, &mut Vec::new())
                    .map_err(|(_, e)| match e {
                        ScanError::UnexpectedEnd => ScanError::UnterminatedTemplate,
                        e => e,
                    })?;
            }
            _ => pos = i + 1,
        }
    }
}

fn template(lex: &mut Lexer<TokenKind>) -> Result<(), ScanError> {
    let body = lex.span().end;
    let end = template_end(lex.source(), body)?;
    lex.bump(end - body);
    Ok(())
}

fn number(lex: &mut Lexer<TokenKind>) {
    let hex = matches!(lex.slice().get(..2), Some("0x" | "0X"));
    if hex || !lex.slice().ends_with(['e', 'E']) || !lex.remainder().starts_with(['+', '-']) {
        return;
    }
    let digits = lex.remainder()[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(lex.remainder().len() - 1);
    lex.bump(1 + digits);
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ScanError)]
enum TagToken {
    #[regex(r"[\t\n\x0B\x0C\r \u{A0}\u{FEFF}]+")]
    Whitespace,

    #[regex(r"//[^\n\r]*")]
    LineComment,

    #[token("/*", tag_block_comment)]
    BlockComment,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Str,

    #[regex(r"[A-Za-z_$\u{80}-\u{9F}\u{A1}-\u{FEFE}\u{FF00}-\u{10FFFF}][A-Za-z0-9_$\-\u{80}-\u{9F}\u{A1}-\u{FEFE}\u{FF00}-\u{10FFFF}]*")]
    Name,

    #[token("{")]
    OpenBrace,

    #[token("/")]
    Slash,

    #[token(">")]
    Close,

    #[regex(r"[=.:]")]
    Punct,
}

fn tag_block_comment(lex: &mut Lexer<TagToken>) -> Result<(), ScanError> {
    let len = block_comment_len(lex.remainder())?;
    lex.bump(len);
    Ok(())
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ScanError)]
enum ChildToken {
    #[regex(r"[^<{]+")]
    Text,

    #[token("{")]
    OpenBrace,

    #[token("<")]
    Open,
}

struct JsxTag<'s> {
    /// Empty for fragments
    name: &'s str,
    end: usize,
    closing: bool,
    self_closing: bool,
}

/// Scan a whole JSX element starting at the `<` at `start`.
///
/// Returns the offset after the element, or `None` if the text there is not
/// a well-formed element (a generic arrow function, say).
fn scan_jsx_element(src: &str, start: usize, out: &mut Vec<Token>) -> Option<usize> {
    let tag = scan_jsx_tag(src, start, out)?;
    if tag.closing {
        return None;
    }
    if tag.self_closing {
        return Some(tag.end);
    }
    scan_jsx_children(src, tag.end, tag.name, out)
}

fn scan_jsx_tag<'s>(src: &'s str, start: usize, out: &mut Vec<Token>) -> Option<JsxTag<'s>> {
    out.push(Token::new(TokenKind::Punct, start..start + 1));

    let mut lex = TagToken::lexer(src);
    lex.bump(start + 1);

    let mut name: Option<Range<usize>> = None;
    let mut naming = true;
    let mut closing = false;
    let mut self_closing = false;

    while let Some(result) = lex.next() {
        let span = lex.span();
        let token = result.ok()?;
        let kind = match token {
            TagToken::Whitespace => {
                naming = name.is_none();
                TokenKind::Whitespace
            }
            TagToken::LineComment => TokenKind::LineComment,
            TagToken::BlockComment => TokenKind::BlockComment,
            TagToken::Str => {
                naming = false;
                TokenKind::Str
            }
            TagToken::Name | TagToken::Punct if naming => {
                name.get_or_insert(span.start..span.start).end = span.end;
                match token {
                    TagToken::Name => TokenKind::JsxName,
                    _ => TokenKind::Punct,
                }
            }
            TagToken::Name => TokenKind::JsxName,
            TagToken::Punct => TokenKind::Punct,
            TagToken::OpenBrace => {
                naming = false;
                out.push(Token::new(TokenKind::Punct, span.clone()));
                let end = scan_script(src, span.end, Until::ClosingBrace, out).ok()?;
                lex.bump(end - span.end);
                continue;
            }
            TagToken::Slash => {
                if name.is_none() && !closing {
                    closing = true;
                } else {
                    self_closing = true;
                    naming = false;
                }
                TokenKind::Punct
            }
            TagToken::Close => {
                out.push(Token::new(TokenKind::Punct, span.clone()));
                return Some(JsxTag {
                    name: name.map_or("", |r| &src[r]),
                    end: span.end,
                    closing,
                    self_closing,
                });
            }
        };
        out.push(Token::new(kind, span));
    }
    None
}

/// Scan children up to and including the closing tag for `name`.
fn scan_jsx_children(src: &str, start: usize, name: &str, out: &mut Vec<Token>) -> Option<usize> {
    let mut lex = ChildToken::lexer(src);
    lex.bump(start);

    while let Some(result) = lex.next() {
        let span = lex.span();
        match result.ok()? {
            ChildToken::Text => out.push(Token::new(TokenKind::JsxText, span)),
            ChildToken::OpenBrace => {
                out.push(Token::new(TokenKind::Punct, span.clone()));
                let end = scan_script(src, span.end, Until::ClosingBrace, out).ok()?;
                lex.bump(end - span.end);
            }
            ChildToken::Open => {
                let tag = scan_jsx_tag(src, span.start, out)?;
                if tag.closing {
                    return (tag.name == name).then_some(tag.end);
                }
                let end = if tag.self_closing {
                    tag.end
                } else {
                    scan_jsx_children(src, tag.end, tag.name, out)?
                };
                lex.bump(end - span.end);
            }
        }
    }
    None
}
