//! Label selectors.
//!
//! Supports the Kubernetes selector grammar: comma-separated requirements
//! of the forms `key=value`, `key==value`, `key!=value`, `key in (a,b)`,
//! `key notin (a,b)`, `key` and `!key`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a label selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty label key in requirement '{0}'")]
    EmptyKey(String),

    #[error("invalid label key '{key}' in requirement '{requirement}'")]
    InvalidKey { key: String, requirement: String },

    #[error("unknown operator '{operator}' in requirement '{requirement}'")]
    UnknownOperator { operator: String, requirement: String },

    #[error("unbalanced parentheses in selector '{0}'")]
    Unbalanced(String),

    #[error("set requirement '{0}' needs at least one value")]
    EmptySet(String),
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

/// Requirement is one clause of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
            Operator::Equals | Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotEquals | Operator::NotIn => !value.is_some_and(|v| self.values.contains(v)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
            Operator::Equals => write!(f, "{}={}", self.key, self.values.join(",")),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values.join(",")),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
        }
    }
}

/// LabelSelector is a conjunction of requirements. The empty selector
/// matches every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Selector that matches everything.
    pub fn everything() -> Self {
        LabelSelector::default()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", requirement)?;
        }
        Ok(())
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let requirements = split_requirements(s)?
            .into_iter()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(parse_requirement)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LabelSelector { requirements })
    }
}

/// Splits on commas that are not inside a parenthesized value set.
fn split_requirements(s: &str) -> Result<Vec<&str>, SelectorError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SelectorError::Unbalanced(s.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SelectorError::Unbalanced(s.to_string()));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn parse_requirement(requirement: &str) -> Result<Requirement, SelectorError> {
    if let Some(key) = requirement.strip_prefix('!') {
        return Ok(Requirement {
            key: validate_key(key.trim(), requirement)?,
            operator: Operator::DoesNotExist,
            values: Vec::new(),
        });
    }

    if let Some(open) = requirement.find('(') {
        let head = requirement[..open].trim();
        let body = requirement[open + 1..]
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| SelectorError::Unbalanced(requirement.to_string()))?;
        let (key, operator) = head
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| SelectorError::UnknownOperator {
                operator: head.to_string(),
                requirement: requirement.to_string(),
            })?;
        let operator = match operator {
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            other => {
                return Err(SelectorError::UnknownOperator {
                    operator: other.to_string(),
                    requirement: requirement.to_string(),
                })
            }
        };
        let values: Vec<String> = body
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return Err(SelectorError::EmptySet(requirement.to_string()));
        }
        return Ok(Requirement {
            key: validate_key(key.trim(), requirement)?,
            operator,
            values,
        });
    }

    let (key, operator, value) = if let Some((k, v)) = requirement.split_once("!=") {
        (k, Operator::NotEquals, v)
    } else if let Some((k, v)) = requirement.split_once("==") {
        (k, Operator::Equals, v)
    } else if let Some((k, v)) = requirement.split_once('=') {
        (k, Operator::Equals, v)
    } else {
        return Ok(Requirement {
            key: validate_key(requirement, requirement)?,
            operator: Operator::Exists,
            values: Vec::new(),
        });
    };

    Ok(Requirement {
        key: validate_key(key.trim(), requirement)?,
        operator,
        values: vec![value.trim().to_string()],
    })
}

fn validate_key(key: &str, requirement: &str) -> Result<String, SelectorError> {
    if key.is_empty() {
        return Err(SelectorError::EmptyKey(requirement.to_string()));
    }
    if key.chars().any(|c| c.is_whitespace() || "=!(),".contains(c)) {
        return Err(SelectorError::InvalidKey {
            key: key.to_string(),
            requirement: requirement.to_string(),
        });
    }
    Ok(key.to_string())
}
