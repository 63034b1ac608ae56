//! S-expression tokenizer
//!
//! Splits source text into brackets, numbers, symbols and string literals.
//! Both bracket shapes are kept distinct here so the parser can reject a
//! mismatched pair like `[x)` with a useful message.

use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::{return_syntax_error, token_log};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    Round,
    Square,
}

impl Bracket {
    pub fn open_char(self) -> char {
        match self {
            Bracket::Round => '(',
            Bracket::Square => '[',
        }
    }

    pub fn close_char(self) -> char {
        match self {
            Bracket::Round => ')',
            Bracket::Square => ']',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Open(Bracket),
    Close(Bracket),
    Number(i64),
    Fractional(f64),
    Symbol(String),
    StringLiteral(String),
    Eof,
}

pub fn tokenize(source_code: &str) -> Result<Vec<TokenKind>, CompileError> {
    let mut tokens = Vec::with_capacity(source_code.len() / 4);
    let mut stream = source_code.chars().peekable();

    loop {
        let token = next_token(&mut stream)?;

        token_log!(&token);

        if token == TokenKind::Eof {
            tokens.push(token);
            return Ok(tokens);
        }

        tokens.push(token);
    }
}

fn next_token(stream: &mut Peekable<Chars>) -> Result<TokenKind, CompileError> {
    let mut current_char = match stream.next() {
        Some(ch) => ch,
        None => return Ok(TokenKind::Eof),
    };

    while current_char.is_whitespace() {
        current_char = match stream.next() {
            Some(ch) => ch,
            None => return Ok(TokenKind::Eof),
        };
    }

    match current_char {
        '(' => return Ok(TokenKind::Open(Bracket::Round)),
        '[' => return Ok(TokenKind::Open(Bracket::Square)),
        ')' => return Ok(TokenKind::Close(Bracket::Round)),
        ']' => return Ok(TokenKind::Close(Bracket::Square)),
        '"' => return read_string_literal(stream),
        _ => {}
    }

    // Everything else is a number or a symbol, read to the next delimiter
    let mut word = String::new();
    word.push(current_char);

    while let Some(&ch) = stream.peek() {
        if ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '"') {
            break;
        }
        word.push(ch);
        stream.next();
    }

    Ok(classify_word(word))
}

fn read_string_literal(stream: &mut Peekable<Chars>) -> Result<TokenKind, CompileError> {
    let mut value = String::new();

    for ch in stream.by_ref() {
        if ch == '"' {
            return Ok(TokenKind::StringLiteral(value));
        }
        value.push(ch);
    }

    return_syntax_error!("Unterminated string literal")
}

/// A word is a number when the whole thing parses as one, otherwise a symbol.
/// A lone `-` stays a symbol.
fn classify_word(word: String) -> TokenKind {
    let numeric_start = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-');

    if numeric_start && word.len() > (word.starts_with('-') as usize) {
        if let Ok(n) = word.parse::<i64>() {
            return TokenKind::Number(n);
        }
        if word.contains('.') {
            if let Ok(x) = word.parse::<f64>() {
                return TokenKind::Fractional(x);
            }
        }
    }

    TokenKind::Symbol(word)
}
