//! Filter tokenizer
//!
//! Splits a filter argument into parentheses, bare words and quoted
//! literals. Quotes are stripped from literals; parentheses inside quotes
//! stay part of the literal.

use std::sync::OnceLock;

use regex::Regex;

/// A lexical token of a filter argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    /// Unquoted word: field name, operator, connective or literal
    Word(String),
    /// Quoted literal with its quotes removed
    Quoted(String),
}

impl Token {
    /// Text of a word or literal token
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Word(s) | Token::Quoted(s) => Some(s),
            _ => None,
        }
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\s*(?:(\()|(\))|'([^']*)'|"([^"]*)"|([^"'()\s]+))"#)
            .expect("filter token pattern is valid")
    })
}

/// Tokenizes one filter argument
pub fn tokenize(input: &str) -> Vec<Token> {
    token_pattern()
        .captures_iter(input)
        .filter_map(|caps| {
            if caps.get(1).is_some() {
                Some(Token::Open)
            } else if caps.get(2).is_some() {
                Some(Token::Close)
            } else if let Some(m) = caps.get(3).or_else(|| caps.get(4)) {
                Some(Token::Quoted(m.as_str().to_string()))
            } else {
                caps.get(5).map(|m| Token::Word(m.as_str().to_string()))
            }
        })
        .collect()
}
