use crate::indent::IndentSettings;
use crate::quickfix::rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contents of a `quickfix.toml` file.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct QuickFixConfig {
    #[serde(default)]
    pub indent: IndentSettings,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    /// Ids of rules that are never offered.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl QuickFixConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if !self.indent.use_tabs && self.indent.width == 0 {
            issues.push(ValidationIssue::ZeroIndentWidth);
        }
        if self.indent.width > 16 {
            issues.push(ValidationIssue::IndentWidthTooLarge {
                width: self.indent.width,
            });
        }

        for id in &self.rules.disabled {
            if rule(id).is_none() {
                issues.push(ValidationIssue::UnknownRule { id: id.clone() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    ZeroIndentWidth,
    IndentWidthTooLarge { width: usize },
    UnknownRule { id: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::ZeroIndentWidth => {
                write!(f, "indent.width must be positive when use_tabs is false")
            }
            ValidationIssue::IndentWidthTooLarge { width } => {
                write!(f, "indent.width {width} is larger than 16")
            }
            ValidationIssue::UnknownRule { id } => {
                write!(f, "rules.disabled names unknown rule '{id}'")
            }
        }
    }
}
