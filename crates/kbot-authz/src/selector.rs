//! Label selector expressions.
//!
//! # Purpose
//! Parses and evaluates the selector strings attached to grants. The
//! grammar is the familiar label-selector subset:
//!
//! - `key = value` / `key == value` equality
//! - `key != value` inequality
//! - `key in (v1, v2)` / `key notin (v1, v2)` set membership
//! - `key` / `!key` existence / non-existence
//!
//! Requirements are joined by top-level commas into a conjunction; commas
//! inside `(...)` belong to the value set. The empty expression parses to
//! the empty selector, which matches everything.
//!
//! # Key invariants
//! - Inequality and `notin` match instances that lack the key entirely, the
//!   same way cluster-side selectors do.
//! - Parsing is strict: empty keys, missing values, and unbalanced
//!   parentheses are errors, never silently ignored requirements.

use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty requirement in selector")]
    EmptyRequirement,
    #[error("empty key in requirement {0:?}")]
    EmptyKey(String),
    #[error("empty value in requirement {0:?}")]
    EmptyValue(String),
    #[error("empty value set in requirement {0:?}")]
    EmptySet(String),
    #[error("unbalanced parentheses in requirement {0:?}")]
    UnbalancedParens(String),
    #[error("malformed requirement {0:?}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One label requirement inside a selector conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self.operator {
            Operator::Equals | Operator::In => labels
                .get(&self.key)
                .is_some_and(|value| self.values.contains(value)),
            Operator::NotEquals | Operator::NotIn => labels
                .get(&self.key)
                .is_none_or(|value| !self.values.contains(value)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

/// Parsed conjunction of label requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        expr.parse()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// True iff every requirement holds against `labels`.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|requirement| requirement.matches(labels))
    }
}

impl FromStr for Selector {
    type Err = ParseError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(Self::default());
        }
        let mut requirements = Vec::new();
        for part in split_top_level(expr)? {
            requirements.push(parse_requirement(part.trim())?);
        }
        Ok(Self { requirements })
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(expr: &str) -> Result<Vec<&str>, ParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in expr.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::UnbalancedParens(expr.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(&expr[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParens(expr.to_string()));
    }
    parts.push(&expr[start..]);
    Ok(parts)
}

fn parse_requirement(raw: &str) -> Result<Requirement, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::EmptyRequirement);
    }
    if raw.contains('(') || raw.contains(')') {
        return parse_set_requirement(raw);
    }
    // "!=" before "=" so "a!=b" does not split at the equals sign.
    if let Some((key, value)) = raw.split_once("!=") {
        return parse_equality(raw, key, value, Operator::NotEquals);
    }
    if let Some((key, value)) = raw.split_once("==") {
        return parse_equality(raw, key, value, Operator::Equals);
    }
    if let Some((key, value)) = raw.split_once('=') {
        return parse_equality(raw, key, value, Operator::Equals);
    }
    if let Some(key) = raw.strip_prefix('!') {
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::EmptyKey(raw.to_string()));
        }
        return Ok(Requirement {
            key: key.to_string(),
            operator: Operator::DoesNotExist,
            values: Vec::new(),
        });
    }
    if raw.split_whitespace().count() != 1 {
        return Err(ParseError::Malformed(raw.to_string()));
    }
    Ok(Requirement {
        key: raw.to_string(),
        operator: Operator::Exists,
        values: Vec::new(),
    })
}

fn parse_equality(
    raw: &str,
    key: &str,
    value: &str,
    operator: Operator,
) -> Result<Requirement, ParseError> {
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(raw.to_string()));
    }
    if value.is_empty() {
        return Err(ParseError::EmptyValue(raw.to_string()));
    }
    Ok(Requirement {
        key: key.to_string(),
        operator,
        values: vec![value.to_string()],
    })
}

fn parse_set_requirement(raw: &str) -> Result<Requirement, ParseError> {
    let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) else {
        return Err(ParseError::UnbalancedParens(raw.to_string()));
    };
    if close < open || !raw[close + 1..].trim().is_empty() {
        return Err(ParseError::Malformed(raw.to_string()));
    }
    let head = raw[..open].trim();
    let Some((key, word)) = head.rsplit_once(char::is_whitespace) else {
        return Err(ParseError::Malformed(raw.to_string()));
    };
    let operator = match word {
        "in" => Operator::In,
        "notin" => Operator::NotIn,
        _ => return Err(ParseError::Malformed(raw.to_string())),
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(raw.to_string()));
    }
    let inner = &raw[open + 1..close];
    if inner.trim().is_empty() {
        return Err(ParseError::EmptySet(raw.to_string()));
    }
    let mut values = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(ParseError::EmptyValue(raw.to_string()));
        }
        if !values.iter().any(|existing| existing == item) {
            values.push(item.to_string());
        }
    }
    Ok(Requirement {
        key: key.to_string(),
        operator,
        values,
    })
}
