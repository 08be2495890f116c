//! Minimal predicate evaluation for the in-memory cluster stand-in.
//!
//! The client passes predicates through verbatim; a real deployment leaves
//! parsing to the cluster's query service. This module plays that server
//! role for the in-memory backend with a deliberately small grammar:
//!
//! ```text
//! expr       := term { OR term }
//! term       := factor { AND factor }
//! factor     := TRUE | FALSE | '(' expr ')' | comparison
//! comparison := field op operand
//! op         := = | != | <> | < | <= | > | >=
//! operand    := $param | 'string' | number | TRUE | FALSE | NULL
//! ```
//!
//! Anything outside the grammar is a [`PredicateError`], which the
//! stand-in reports as an error-status query result — the same way the
//! real query service rejects a malformed statement.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use docbridge_core::document::Document;

/// Rejection reasons for a statement the stand-in cannot execute.
#[derive(Error, Debug)]
pub enum PredicateError {
    #[error("unexpected character {0:?} in predicate")]
    UnexpectedCharacter(char),
    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),
    #[error("unexpected end of predicate")]
    UnexpectedEnd,
    #[error("unbound parameter ${0}")]
    UnboundParameter(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Param(String),
    Str(String),
    Num(f64),
    True,
    False,
    Null,
    Op(CmpOp),
    And,
    Or,
    LParen,
    RParen,
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Right-hand side of a comparison: a named parameter or a literal.
#[derive(Debug, Clone)]
pub enum Operand {
    Param(String),
    Literal(Value),
}

/// A parsed predicate, ready to be bound and evaluated per document.
#[derive(Debug, Clone)]
pub enum Predicate {
    Literal(bool),
    Cmp {
        field: String,
        op: CmpOp,
        operand: Operand,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Parses predicate text into an expression tree.
    pub fn parse(input: &str) -> Result<Self, PredicateError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(PredicateError::UnexpectedToken(format!("{tok:?}"))),
        }
    }

    /// Resolves `$name` operands against the bound parameter object.
    ///
    /// Binding happens once per statement, before any document is scanned;
    /// an unbound parameter rejects the whole statement.
    pub fn bind(self, parameters: Option<&Map<String, Value>>) -> Result<Self, PredicateError> {
        match self {
            Predicate::Cmp {
                field,
                op,
                operand: Operand::Param(name),
            } => {
                let value = parameters
                    .and_then(|params| params.get(&name))
                    .cloned()
                    .ok_or(PredicateError::UnboundParameter(name))?;
                Ok(Predicate::Cmp {
                    field,
                    op,
                    operand: Operand::Literal(value),
                })
            }
            Predicate::And(list) => Ok(Predicate::And(
                list.into_iter()
                    .map(|p| p.bind(parameters))
                    .collect::<Result<_, _>>()?,
            )),
            Predicate::Or(list) => Ok(Predicate::Or(
                list.into_iter()
                    .map(|p| p.bind(parameters))
                    .collect::<Result<_, _>>()?,
            )),
            other => Ok(other),
        }
    }

    /// Evaluates a bound predicate against one document.
    ///
    /// A comparison against a missing field is false, whatever the
    /// operator.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Predicate::Literal(value) => *value,
            Predicate::And(list) => list.iter().all(|p| p.matches(document)),
            Predicate::Or(list) => list.iter().any(|p| p.matches(document)),
            Predicate::Cmp { field, op, operand } => {
                let literal = match operand {
                    Operand::Literal(value) => value,
                    // bind() replaces every Param before evaluation
                    Operand::Param(_) => return false,
                };
                match document.get(field) {
                    Some(value) => compare(value, *op, literal),
                    None => false,
                }
            }
        }
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> bool {
    match op {
        CmpOp::Eq => value_eq(left, right),
        CmpOp::Ne => !value_eq(left, right),
        CmpOp::Lt | CmpOp::Lte | CmpOp::Gt | CmpOp::Gte => match value_cmp(left, right) {
            Some(ordering) => match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Lte => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::Gte => ordering != Ordering::Less,
                CmpOp::Eq | CmpOp::Ne => unreachable!(),
            },
            None => false,
        },
    }
}

// Numbers compare by value regardless of integer/float representation.
fn value_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn value_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, PredicateError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Op(CmpOp::Eq));
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Op(CmpOp::Ne)),
                    _ => return Err(PredicateError::UnexpectedCharacter('!')),
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Op(CmpOp::Lte));
                    }
                    Some('>') => {
                        chars.next();
                        tokens.push(Token::Op(CmpOp::Ne));
                    }
                    _ => tokens.push(Token::Op(CmpOp::Lt)),
                }
            }
            '>' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Op(CmpOp::Gte));
                    }
                    _ => tokens.push(Token::Op(CmpOp::Gt)),
                }
            }
            '$' => {
                chars.next();
                let name = take_word(&mut chars);
                if name.is_empty() {
                    return Err(PredicateError::UnexpectedCharacter('$'));
                }
                tokens.push(Token::Param(name));
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => text.push(c),
                        None => return Err(PredicateError::UnexpectedEnd),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = text
                    .parse::<f64>()
                    .map_err(|_| PredicateError::UnexpectedToken(text))?;
                tokens.push(Token::Num(number));
            }
            c if c.is_alphabetic() || c == '_' || c == '`' => {
                let word = take_word(&mut chars);
                tokens.push(match word.to_ascii_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "TRUE" => Token::True,
                    "FALSE" => Token::False,
                    "NULL" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(PredicateError::UnexpectedCharacter(other)),
        }
    }

    Ok(tokens)
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '.' || c == '`' {
            if c != '`' {
                word.push(c);
            }
            chars.next();
        } else {
            break;
        }
    }
    word
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Predicate, PredicateError> {
        let mut terms = vec![self.term()?];
        while self.peek() == Some(&Token::Or) {
            self.next();
            terms.push(self.term()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Predicate::Or(terms)
        })
    }

    fn term(&mut self) -> Result<Predicate, PredicateError> {
        let mut factors = vec![self.factor()?];
        while self.peek() == Some(&Token::And) {
            self.next();
            factors.push(self.factor()?);
        }
        Ok(if factors.len() == 1 {
            factors.remove(0)
        } else {
            Predicate::And(factors)
        })
    }

    fn factor(&mut self) -> Result<Predicate, PredicateError> {
        match self.next() {
            Some(Token::True) => Ok(Predicate::Literal(true)),
            Some(Token::False) => Ok(Predicate::Literal(false)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(PredicateError::UnexpectedToken(format!("{tok:?}"))),
                    None => Err(PredicateError::UnexpectedEnd),
                }
            }
            Some(Token::Ident(field)) => {
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    Some(tok) => return Err(PredicateError::UnexpectedToken(format!("{tok:?}"))),
                    None => return Err(PredicateError::UnexpectedEnd),
                };
                let operand = match self.next() {
                    Some(Token::Param(name)) => Operand::Param(name),
                    Some(Token::Str(text)) => Operand::Literal(Value::String(text)),
                    Some(Token::Num(number)) => Operand::Literal(
                        Number::from_f64(number).map_or(Value::Null, Value::Number),
                    ),
                    Some(Token::True) => Operand::Literal(Value::Bool(true)),
                    Some(Token::False) => Operand::Literal(Value::Bool(false)),
                    Some(Token::Null) => Operand::Literal(Value::Null),
                    Some(tok) => return Err(PredicateError::UnexpectedToken(format!("{tok:?}"))),
                    None => return Err(PredicateError::UnexpectedEnd),
                };
                Ok(Predicate::Cmp { field, op, operand })
            }
            Some(tok) => Err(PredicateError::UnexpectedToken(format!("{tok:?}"))),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn eval(predicate: &str, document: &Document) -> bool {
        Predicate::parse(predicate)
            .unwrap()
            .bind(None)
            .unwrap()
            .matches(document)
    }

    #[test]
    fn literal_booleans() {
        let d = doc(json!({}));
        assert!(eval("TRUE", &d));
        assert!(!eval("FALSE", &d));
        assert!(eval("true", &d));
    }

    #[test]
    fn equality_on_strings_and_numbers() {
        let d = doc(json!({"email": "a@x.com", "age": 30}));
        assert!(eval("email = 'a@x.com'", &d));
        assert!(!eval("email = 'b@x.com'", &d));
        assert!(eval("age = 30", &d));
        assert!(eval("age != 29", &d));
        assert!(eval("age <> 29", &d));
    }

    #[test]
    fn ordering_comparisons() {
        let d = doc(json!({"age": 30, "name": "alice"}));
        assert!(eval("age > 21", &d));
        assert!(eval("age >= 30", &d));
        assert!(!eval("age < 30", &d));
        assert!(eval("name < 'bob'", &d));
    }

    #[test]
    fn conjunctions_and_grouping() {
        let d = doc(json!({"age": 30, "active": true}));
        assert!(eval("age > 21 AND active = TRUE", &d));
        assert!(!eval("age > 40 AND active = TRUE", &d));
        assert!(eval("age > 40 OR active = TRUE", &d));
        assert!(eval("(age > 40 OR active = TRUE) AND age = 30", &d));
    }

    #[test]
    fn missing_field_never_matches() {
        let d = doc(json!({"age": 30}));
        assert!(!eval("email = 'a@x.com'", &d));
        assert!(!eval("email != 'a@x.com'", &d));
    }

    #[test]
    fn named_parameters_bind_before_evaluation() {
        let d = doc(json!({"email": "a@x.com"}));
        let params = json!({"email": "a@x.com"}).as_object().cloned().unwrap();
        let predicate = Predicate::parse("email = $email")
            .unwrap()
            .bind(Some(&params))
            .unwrap();
        assert!(predicate.matches(&d));
    }

    #[test]
    fn unbound_parameter_is_rejected() {
        let err = Predicate::parse("email = $email").unwrap().bind(None);
        assert!(matches!(err, Err(PredicateError::UnboundParameter(_))));
    }

    #[test]
    fn malformed_predicates_are_rejected() {
        assert!(Predicate::parse("email =").is_err());
        assert!(Predicate::parse("= 'x'").is_err());
        assert!(Predicate::parse("email = 'x' junk 1").is_err());
        assert!(Predicate::parse("email ~ 'x'").is_err());
    }

    #[test]
    fn integer_and_float_representations_compare_equal() {
        let d = doc(json!({"score": 3.0}));
        assert!(eval("score = 3", &d));
    }
}
