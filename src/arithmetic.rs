//! Spoken arithmetic: "5 plus 3" → 8.
//!
//! Operator words are replaced by symbols, then the result is tokenized with
//! a tokenizer that only knows decimal numbers and `+ - * /`. Anything else
//! (spelled-out numbers, names, punctuation) is rejected before evaluation.

use std::fmt;

/// Words that mark an utterance as arithmetic.
pub const OPERATOR_WORDS: [&str; 4] = ["plus", "minus", "times", "divided"];

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("malformed expression")]
    MalformedExpression,
    #[error("division by zero")]
    DivisionByZero,
    #[error("empty expression")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
}

/// Whether the utterance mentions any operator word.
#[must_use]
pub fn mentions_operator(utterance: &str) -> bool {
    OPERATOR_WORDS.iter().any(|w| utterance.contains(w))
}

/// Replace operator words with symbols. Other words pass through untouched
/// and are rejected later by the tokenizer.
fn substitute_operator_words(utterance: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut words = utterance.split_whitespace().peekable();
    while let Some(word) = words.next() {
        let symbol = match word {
            "plus" => "+",
            "minus" => "-",
            "times" => "*",
            "multiplied" | "divided" => {
                let symbol = if word == "divided" { "/" } else { "*" };
                if words.peek() == Some(&"by") {
                    words.next();
                }
                symbol
            }
            other => other,
        };
        out.push(symbol);
    }
    out.join(" ")
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ArithmeticError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ArithmeticError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                return Err(ArithmeticError::UnexpectedToken(word));
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent evaluator over the restricted token set.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<f64, ArithmeticError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ArithmeticError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ArithmeticError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ArithmeticError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Plus) => self.factor(),
            _ => Err(ArithmeticError::MalformedExpression),
        }
    }
}

/// Evaluate a spoken arithmetic utterance.
///
/// # Errors
///
/// Returns an [`ArithmeticError`] for any token outside numbers and the four
/// operators, for malformed expressions, and for division by zero.
pub fn evaluate(utterance: &str) -> Result<f64, ArithmeticError> {
    let expr = substitute_operator_words(utterance);
    let tokens = tokenize(&expr)?;
    if tokens.is_empty() {
        return Err(ArithmeticError::Empty);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(ArithmeticError::MalformedExpression);
    }
    Ok(value)
}

/// A result formatted for speech: whole numbers without a decimal point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Answer(pub f64);

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
