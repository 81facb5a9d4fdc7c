use super::Token;

/// The default base for numbers that carry no explicit prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Radix {
    #[default]
    Hex,
    Decimal,
    Octal,
    Binary,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Hex => 16,
            Radix::Decimal => 10,
            Radix::Octal => 8,
            Radix::Binary => 2,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            Radix::Hex => "Hexadecimal",
            Radix::Decimal => "Decimal",
            Radix::Octal => "Octal",
            Radix::Binary => "Binary",
        }
    }
    /// Accepts the single letters `h d o b` as well as the full words.
    pub fn from_word(word: &str) -> Option<Self> {
        let word = word.to_ascii_lowercase();
        match word.as_str() {
            "h" | "hex" | "hexadecimal" => Some(Radix::Hex),
            "d" | "dec" | "decimal" => Some(Radix::Decimal),
            "o" | "oct" | "octal" => Some(Radix::Octal),
            "b" | "bin" | "binary" => Some(Radix::Binary),
            _ => None,
        }
    }
}

/// How a number token was written.
///
/// Prefixed forms (`$ff`, `+10`, `&17`, `%101`) and bare digit strings that
/// contain a hex letter are definite. Bare digit strings are guesses: the
/// digits they contain bound the smallest base they could be written in, and
/// the session radix settles the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Hex,
    Decimal,
    Octal,
    Binary,
    DecimalGuess,
    OctalGuess,
    BinaryGuess,
    /// Exactly eight hex digits, which in hex radix denote a start and an end.
    RangeGuess,
}

impl NumberKind {
    /// Value of the token `text`, which may still carry its prefix.
    pub fn value(self, text: &str, radix: Radix) -> i64 {
        let digits = strip_prefix(text);
        match self {
            NumberKind::Hex => strtol(digits, 16),
            NumberKind::Decimal => strtol(digits, 10),
            NumberKind::Octal => strtol(digits, 8),
            NumberKind::Binary => strtol(digits, 2),
            NumberKind::DecimalGuess | NumberKind::OctalGuess | NumberKind::BinaryGuess => {
                resolve_datatype(self, digits, radix)
            }
            NumberKind::RangeGuess => match guess(digits) {
                Some(NumberKind::Hex) | None => strtol(digits, 16),
                Some(kind) => resolve_datatype(kind, digits, radix),
            },
        }
    }
    /// Value in base ten for the guessed forms, as checkpoint numbers are read.
    pub fn decimal_value(self, text: &str) -> i64 {
        match self {
            NumberKind::DecimalGuess
            | NumberKind::OctalGuess
            | NumberKind::BinaryGuess
            | NumberKind::RangeGuess => strtol(text, 10),
            _ => self.value(text, Radix::Decimal),
        }
    }
    pub fn is_guess(self) -> bool {
        matches!(
            self,
            NumberKind::DecimalGuess
                | NumberKind::OctalGuess
                | NumberKind::BinaryGuess
                | NumberKind::RangeGuess
        )
    }
}

fn strip_prefix(text: &str) -> &str {
    match text.as_bytes().first() {
        Some(b'$' | b'+' | b'&' | b'%') => &text[1..],
        _ => text,
    }
}

/// Classifies a bare word made of `[A-Za-z0-9_]`.
pub(super) fn classify(text: &str) -> Token {
    if text.len() == 8 && text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Token::Number(NumberKind::RangeGuess);
    }
    match guess(text) {
        Some(kind) => Token::Number(kind),
        None => Token::Word,
    }
}

/// The narrowest kind whose digits cover `text`.
fn guess(text: &str) -> Option<NumberKind> {
    let all = |f: fn(char) -> bool| !text.is_empty() && text.chars().all(f);
    if all(|c| matches!(c, '0' | '1')) {
        Some(NumberKind::BinaryGuess)
    } else if all(|c| matches!(c, '0'..='7')) {
        Some(NumberKind::OctalGuess)
    } else if all(|c| c.is_ascii_digit()) {
        Some(NumberKind::DecimalGuess)
    } else if all(|c| c.is_ascii_hexdigit()) {
        Some(NumberKind::Hex)
    } else {
        None
    }
}

/// Reads a guessed number in the base the session radix and the guess allow.
///
/// Hex radix reads every digit string as hex. Otherwise a decimal guess (or
/// decimal radix) reads base ten, an octal guess (or octal radix) base eight,
/// and anything left reads base two.
pub fn resolve_datatype(guess: NumberKind, digits: &str, radix: Radix) -> i64 {
    if radix == Radix::Hex {
        strtol(digits, 16)
    } else if guess == NumberKind::DecimalGuess || radix == Radix::Decimal {
        strtol(digits, 10)
    } else if guess == NumberKind::OctalGuess || radix == Radix::Octal {
        strtol(digits, 8)
    } else {
        strtol(digits, 2)
    }
}

/// Parses the longest valid prefix of `text` in `base`, saturating on
/// overflow. Leading blanks and a sign are accepted; no digits yields zero.
pub fn strtol(text: &str, base: u32) -> i64 {
    let text = text.trim_start();
    let (negative, text) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for digit in text.chars().map_while(|c| c.to_digit(base)) {
        value = match value
            .checked_mul(base as i64)
            .and_then(|v| v.checked_add(digit as i64))
        {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }
    if negative {
        -value
    } else {
        value
    }
}
