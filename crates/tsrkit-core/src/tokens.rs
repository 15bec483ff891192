//! Whitespace-delimited token reader for the TSR text format.
//!
//! Tokens are consumed strictly in order, like extracting from a text
//! stream. Every read names what it expected so parse errors point at the
//! field that was malformed.

use std::str::SplitWhitespace;

use crate::error::ParseError;

/// Sequential reader over whitespace-separated tokens.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    tokens: SplitWhitespace<'a>,
    remaining: usize,
}

impl<'a> TokenReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: input.split_whitespace(),
            remaining: input.split_whitespace().count(),
        }
    }

    /// Number of tokens not yet consumed.
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Next raw token.
    pub fn next_token(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        let token = self
            .tokens
            .next()
            .ok_or(ParseError::UnexpectedEof { expected })?;
        self.remaining -= 1;
        Ok(token)
    }

    /// A `0` / `1` flag.
    pub fn read_flag(&mut self, expected: &'static str) -> Result<bool, ParseError> {
        match self.next_token(expected)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(invalid(expected, other)),
        }
    }

    pub fn read_i64(&mut self, expected: &'static str) -> Result<i64, ParseError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| invalid(expected, token))
    }

    pub fn read_i32(&mut self, expected: &'static str) -> Result<i32, ParseError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| invalid(expected, token))
    }

    /// A finite floating-point value.
    pub fn read_f64(&mut self, expected: &'static str) -> Result<f64, ParseError> {
        let token = self.next_token(expected)?;
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(expected, token)),
        }
    }

    pub fn read_f64_array<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<[f64; N], ParseError> {
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.read_f64(expected)?;
        }
        Ok(out)
    }
}

fn invalid(expected: &'static str, token: &str) -> ParseError {
    ParseError::InvalidToken {
        expected,
        token: token.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
