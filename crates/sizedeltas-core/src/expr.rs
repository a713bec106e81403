//! Evaluator for the subset of GitHub Actions expressions used in workflow
//! `if:` and `continue-on-error:` fields and input defaults.
//!
//! Supported: `${{ }}` wrappers, `'string'` literals (`''` escapes a quote),
//! `true`/`false`/`null`, dotted context paths, `==`, `!=`, `!`, `&&`, `||`
//! and parentheses. String comparison ignores ASCII case. Operands of
//! different types are compared as numbers, as on GitHub, so
//! `true == 'true'` is false while `null == ''` and `false == ''` hold.

use crate::error::{Result, SizeDeltasError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }

    fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.eq_ignore_ascii_case(b),
            _ => self.to_number() == other.to_number(),
        }
    }

    /// NaN for strings that are not numbers, so they equal nothing.
    fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Str(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else if let Some(hex) = s.strip_prefix("0x") {
                    i64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64)
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// String form used when an expression fills in an input value.
    pub fn into_string(self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s,
        }
    }
}

/// Flat context keyed by dotted path, e.g. `github.event_name`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, value: impl Into<String>) -> Self {
        self.set(path, value);
        self
    }

    pub fn set(&mut self, path: &str, value: impl Into<String>) {
        self.values.insert(path.to_string(), value.into());
    }

    fn lookup(&self, path: &str) -> Value {
        self.values
            .get(path)
            .map(|v| Value::Str(v.clone()))
            .unwrap_or(Value::Null)
    }
}

/// Strip an optional `${{ ... }}` wrapper.
pub fn unwrap_expression(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed
        .strip_prefix("${{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Whether `source` is wrapped in `${{ }}`.
pub fn is_expression(source: &str) -> bool {
    let trimmed = source.trim();
    trimmed.starts_with("${{") && trimmed.ends_with("}}")
}

pub fn evaluate(source: &str, ctx: &Context) -> Result<Value> {
    let expr = unwrap_expression(source);
    let tokens = tokenize(expr).map_err(|reason| invalid(source, reason))?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        ctx,
    };
    let value = parser.or().map_err(|reason| invalid(source, reason))?;
    if parser.pos != tokens.len() {
        return Err(invalid(source, "unexpected trailing tokens".into()));
    }
    Ok(value)
}

pub fn evaluate_bool(source: &str, ctx: &Context) -> Result<bool> {
    evaluate(source, ctx).map(|v| v.is_truthy())
}

fn invalid(expr: &str, reason: String) -> SizeDeltasError {
    SizeDeltasError::Expression {
        expr: expr.to_string(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Ident(String),
    Eq,
    Ne,
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '\'' => {
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string literal".into()),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            s.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '_' | '-' | '.'))
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'a Context,
}

type ParseResult = std::result::Result<Value, String>;

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> ParseResult {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            // `a || b` yields the first truthy operand.
            left = if left.is_truthy() { left } else { right };
        }
        Ok(left)
    }

    fn and(&mut self) -> ParseResult {
        let mut left = self.comparison()?;
        while self.eat(&Token::And) {
            let right = self.comparison()?;
            left = if left.is_truthy() { right } else { left };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult {
        let left = self.unary()?;
        if self.eat(&Token::Eq) {
            let right = self.unary()?;
            return Ok(Value::Bool(left.loosely_equals(&right)));
        }
        if self.eat(&Token::Ne) {
            let right = self.unary()?;
            return Ok(Value::Bool(!left.loosely_equals(&right)));
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult {
        if self.eat(&Token::Not) {
            let value = self.unary()?;
            return Ok(Value::Bool(!value.is_truthy()));
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        self.pos += 1;
        match token {
            Token::LParen => {
                let value = self.or()?;
                if !self.eat(&Token::RParen) {
                    return Err("missing ')'".into());
                }
                Ok(value)
            }
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                path => self.ctx.lookup(path),
            }),
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}
