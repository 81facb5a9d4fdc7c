
mod number;

pub use number::{resolve_datatype, strtol, NumberKind, Radix};

use crate::addr::MemSpace;
use crate::cond::CompareOp;

#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    // NOTE: 'from' must come before 'to' for proper ordering
    pub from: u32,
    pub to: u32,
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.from, self.to)
    }
}

impl Span {
    pub fn slice(self, src: &str) -> &str {
        &src[self.from as usize..self.to as usize]
    }
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> u32 {
        self.to - self.from
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Number(NumberKind),
    /// `c:`, `8:` .. `11:`, the colon included.
    MemSpace(MemSpace),
    /// `.name`, the dot included.
    Label,
    Word,
    /// A terminated double-quoted string, quotes included.
    String,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semi,
    Hash,
    At,
    Tilde,
    Question,
    Equals,
    Less,
    Greater,
    Compare(CompareOp),
    Unknown(char),
    Eol,
}

pub use private::Lexer;

mod private {
    use std::str::Chars;

    use super::{Span, Token};

    /// A restartable lexer over a single input line.
    ///
    /// The parser owns the cursor position; lexing never mutates the lexer
    /// itself, so peeking is just lexing without storing the new position.
    #[derive(Debug, Clone, Copy)]
    pub struct Lexer<'a> {
        src: &'a str,
    }

    const EOF_CHAR: char = '\0';

    pub(super) struct Cursor<'a> {
        chars: Chars<'a>,
        pos: u32,
    }

    impl<'a> Cursor<'a> {
        pub(super) fn first(&self) -> char {
            self.chars.clone().next().unwrap_or(EOF_CHAR)
        }
        pub(super) fn bump(&mut self) -> Option<char> {
            let ch = self.chars.next()?;
            self.pos += ch.len_utf8() as u32;
            Some(ch)
        }
        pub(super) fn is_eof(&self) -> bool {
            self.chars.as_str().is_empty()
        }
        pub(super) fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
            while predicate(self.first()) && !self.is_eof() {
                self.bump();
            }
        }
        pub(super) fn pos(&self) -> u32 {
            self.pos
        }
    }

    impl<'a> Lexer<'a> {
        pub fn new(src: &'a str) -> Self {
            Self { src }
        }
        pub fn src(&self) -> &'a str {
            self.src
        }
        pub fn len(&self) -> u32 {
            self.src.len() as u32
        }
        pub fn is_empty(&self) -> bool {
            self.src.is_empty()
        }
        pub fn slice(&self, span: Span) -> &'a str {
            span.slice(self.src)
        }
        pub(super) fn cursor(&self, pos: u32) -> Cursor<'a> {
            let pos = pos.min(self.len());
            Cursor {
                chars: self.src[pos as usize..].chars(),
                pos,
            }
        }
        /// Lexes the first token at or after `pos`.
        ///
        /// `operand` admits the `+123` decimal form, which is otherwise a
        /// plus sign followed by a number.
        pub fn token(&self, pos: u32, operand: bool) -> (Span, Token) {
            let mut cursor = self.cursor(pos);
            cursor.eat_while(super::is_blank);
            let start = cursor.pos();
            let token = super::advance(&mut cursor, self.src, operand);
            (Span::new(start, cursor.pos()), token)
        }
        /// The rest of the line after `pos`, blanks trimmed from both ends.
        pub fn rest(&self, pos: u32) -> Span {
            let mut cursor = self.cursor(pos);
            cursor.eat_while(super::is_blank);
            let from = cursor.pos();
            let text = &self.src[from as usize..];
            let text = text.trim_end_matches(|c: char| super::is_blank(c) || c == '\n' || c == '\r');
            Span::new(from, from + text.len() as u32)
        }
    }
}

fn advance(cursor: &mut private::Cursor, src: &str, operand: bool) -> Token {
    let start = cursor.pos();
    let Some(ch) = cursor.bump() else {
        return Token::Eol;
    };
    match ch {
        '\n' | '\r' => Token::Eol,
        _ if is_word_char(ch) => {
            cursor.eat_while(is_word_char);
            let text = &src[start as usize..cursor.pos() as usize];
            if cursor.first() == ':' {
                if let Some(space) = MemSpace::from_prefix(text) {
                    cursor.bump();
                    return Token::MemSpace(space);
                }
            }
            number::classify(text)
        }
        '$' if cursor.first().is_ascii_hexdigit() => {
            cursor.eat_while(|c| c.is_ascii_hexdigit());
            Token::Number(NumberKind::Hex)
        }
        '%' if matches!(cursor.first(), '0' | '1') => {
            cursor.eat_while(|c| matches!(c, '0' | '1'));
            Token::Number(NumberKind::Binary)
        }
        '&' if cursor.first() == '&' => {
            cursor.bump();
            Token::Compare(CompareOp::And)
        }
        '&' if matches!(cursor.first(), '0'..='7') => {
            cursor.eat_while(|c| matches!(c, '0'..='7'));
            Token::Number(NumberKind::Octal)
        }
        '+' if operand && cursor.first().is_ascii_digit() => {
            cursor.eat_while(|c| c.is_ascii_digit());
            Token::Number(NumberKind::Decimal)
        }
        '.' if is_word_char(cursor.first()) => {
            cursor.eat_while(is_word_char);
            Token::Label
        }
        '"' => {
            while let Some(c) = cursor.bump() {
                match c {
                    '"' => return Token::String,
                    '\\' if cursor.first() == '\\' || cursor.first() == '"' => {
                        // Bump again to skip escaped character.
                        cursor.bump();
                    }
                    _ => (),
                }
            }
            Token::Unknown('"')
        }
        '=' if cursor.first() == '=' => {
            cursor.bump();
            Token::Compare(CompareOp::Eq)
        }
        '!' if cursor.first() == '=' => {
            cursor.bump();
            Token::Compare(CompareOp::Ne)
        }
        '<' if cursor.first() == '=' => {
            cursor.bump();
            Token::Compare(CompareOp::Le)
        }
        '<' if cursor.first() == '>' => {
            cursor.bump();
            Token::Compare(CompareOp::Ne)
        }
        '>' if cursor.first() == '=' => {
            cursor.bump();
            Token::Compare(CompareOp::Ge)
        }
        '|' if cursor.first() == '|' => {
            cursor.bump();
            Token::Compare(CompareOp::Or)
        }
        '=' => Token::Equals,
        '<' => Token::Less,
        '>' => Token::Greater,
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Star,
        '/' => Token::Slash,
        '(' => Token::LParen,
        ')' => Token::RParen,
        '[' => Token::LBracket,
        ']' => Token::RBracket,
        ',' => Token::Comma,
        ':' => Token::Colon,
        ';' => Token::Semi,
        '#' => Token::Hash,
        '@' => Token::At,
        '~' => Token::Tilde,
        '?' => Token::Question,
        _ => Token::Unknown(ch),
    }
}

/// The contents of a string token: quotes stripped, escapes resolved.
pub fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}
fn is_word_char(ch: char) -> bool {
    matches!(ch, 'a'..='z' | 'A'..='Z' | '_' | '0'..='9')
}
