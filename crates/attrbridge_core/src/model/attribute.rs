//! Member attribute model.
//!
//! # Responsibility
//! - Describe member annotations as an explicit tagged union instead of
//!   runtime-inspected marker types.
//! - Provide the kind discriminant used when attribute sets are merged.
//!
//! # Invariants
//! - Two attributes collide during merging iff their `kind()` is equal.
//! - Parameters never take part in that comparison.
//! - Declarations are validated once at load time, never during resolution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Discriminant of one attribute category.
///
/// Built-in kinds mirror the common data-annotation set. `Custom` covers
/// host-defined validation attributes; two custom attributes share a kind only
/// when their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    Required,
    StringLength,
    MaxLength,
    MinLength,
    Range,
    RegularExpression,
    EmailAddress,
    Phone,
    Url,
    CreditCard,
    Compare,
    Custom(String),
    DisplayName,
    DataType,
    ReadOnly,
    ScaffoldColumn,
}

impl AttributeKind {
    /// Stable snake_case id. Matches the `kind` tag in mapping documents for
    /// built-in kinds; `Custom` returns its own name, not `custom`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::StringLength => "string_length",
            Self::MaxLength => "max_length",
            Self::MinLength => "min_length",
            Self::Range => "range",
            Self::RegularExpression => "regular_expression",
            Self::EmailAddress => "email_address",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::CreditCard => "credit_card",
            Self::Compare => "compare",
            Self::Custom(name) => name.as_str(),
            Self::DisplayName => "display_name",
            Self::DataType => "data_type",
            Self::ReadOnly => "read_only",
            Self::ScaffoldColumn => "scaffold_column",
        }
    }

    /// Returns whether attributes of this kind constrain a member's value.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::DisplayName | Self::DataType | Self::ReadOnly | Self::ScaffoldColumn
        )
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "custom:{name}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Kind-specific parameters of a validation attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    Required {
        #[serde(default)]
        allow_empty_strings: bool,
    },
    StringLength {
        max: usize,
        #[serde(default)]
        min: usize,
    },
    MaxLength {
        length: usize,
    },
    MinLength {
        length: usize,
    },
    Range {
        min: f64,
        max: f64,
    },
    RegularExpression {
        pattern: String,
    },
    EmailAddress,
    Phone,
    Url,
    CreditCard,
    Compare {
        other_property: String,
    },
    Custom {
        name: String,
    },
}

/// Validation attribute declared on a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationAttribute {
    #[serde(flatten)]
    pub rule: ValidationRule,
    /// Overrides the default message; `{0}` is replaced with the display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationAttribute {
    pub fn new(rule: ValidationRule) -> Self {
        Self {
            rule,
            error_message: None,
        }
    }

    pub fn required() -> Self {
        Self::new(ValidationRule::Required {
            allow_empty_strings: false,
        })
    }

    pub fn string_length(max: usize) -> Self {
        Self::new(ValidationRule::StringLength { max, min: 0 })
    }

    pub fn max_length(length: usize) -> Self {
        Self::new(ValidationRule::MaxLength { length })
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::new(ValidationRule::Range { min, max })
    }

    pub fn regular_expression(pattern: impl Into<String>) -> Self {
        Self::new(ValidationRule::RegularExpression {
            pattern: pattern.into(),
        })
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(ValidationRule::Custom { name: name.into() })
    }

    /// Sets the message override.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn kind(&self) -> AttributeKind {
        match &self.rule {
            ValidationRule::Required { .. } => AttributeKind::Required,
            ValidationRule::StringLength { .. } => AttributeKind::StringLength,
            ValidationRule::MaxLength { .. } => AttributeKind::MaxLength,
            ValidationRule::MinLength { .. } => AttributeKind::MinLength,
            ValidationRule::Range { .. } => AttributeKind::Range,
            ValidationRule::RegularExpression { .. } => AttributeKind::RegularExpression,
            ValidationRule::EmailAddress => AttributeKind::EmailAddress,
            ValidationRule::Phone => AttributeKind::Phone,
            ValidationRule::Url => AttributeKind::Url,
            ValidationRule::CreditCard => AttributeKind::CreditCard,
            ValidationRule::Compare { .. } => AttributeKind::Compare,
            ValidationRule::Custom { name } => AttributeKind::Custom(name.clone()),
        }
    }

    /// Rejects declarations that can never be satisfied or evaluated.
    pub fn validate_declaration(&self) -> Result<(), AttributeDeclarationError> {
        match &self.rule {
            ValidationRule::StringLength { max, min } if min > max => {
                Err(AttributeDeclarationError::InvertedBounds {
                    kind: self.kind(),
                    min: *min as f64,
                    max: *max as f64,
                })
            }
            ValidationRule::Range { min, max } => {
                if min.is_nan() || max.is_nan() {
                    return Err(AttributeDeclarationError::NotANumber);
                }
                if min > max {
                    return Err(AttributeDeclarationError::InvertedBounds {
                        kind: self.kind(),
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            ValidationRule::RegularExpression { pattern } => {
                if pattern.trim().is_empty() {
                    return Err(AttributeDeclarationError::EmptyPattern);
                }
                Regex::new(pattern).map_err(|err| AttributeDeclarationError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })?;
                Ok(())
            }
            ValidationRule::Compare { other_property } if other_property.trim().is_empty() => {
                Err(AttributeDeclarationError::EmptyCompareTarget)
            }
            ValidationRule::Custom { name } if name.trim().is_empty() => {
                Err(AttributeDeclarationError::EmptyCustomName)
            }
            _ => Ok(()),
        }
    }

    /// Formats the user-facing message for a member shown as `display_name`.
    pub fn format_error_message(&self, display_name: &str) -> String {
        if let Some(template) = &self.error_message {
            return template.replace("{0}", display_name);
        }

        match &self.rule {
            ValidationRule::Required { .. } => format!("The {display_name} field is required."),
            ValidationRule::StringLength { max, min: 0 } => format!(
                "The field {display_name} must be a string with a maximum length of {max}."
            ),
            ValidationRule::StringLength { max, min } => format!(
                "The field {display_name} must be a string with a minimum length of {min} and a maximum length of {max}."
            ),
            ValidationRule::MaxLength { length } => format!(
                "The field {display_name} must be a string or array type with a maximum length of '{length}'."
            ),
            ValidationRule::MinLength { length } => format!(
                "The field {display_name} must be a string or array type with a minimum length of '{length}'."
            ),
            ValidationRule::Range { min, max } => {
                format!("The field {display_name} must be between {min} and {max}.")
            }
            ValidationRule::RegularExpression { pattern } => format!(
                "The field {display_name} must match the regular expression '{pattern}'."
            ),
            ValidationRule::EmailAddress => {
                format!("The {display_name} field is not a valid e-mail address.")
            }
            ValidationRule::Phone => {
                format!("The {display_name} field is not a valid phone number.")
            }
            ValidationRule::Url => format!(
                "The {display_name} field is not a valid fully-qualified http, https, or ftp URL."
            ),
            ValidationRule::CreditCard => {
                format!("The {display_name} field is not a valid credit card number.")
            }
            ValidationRule::Compare { other_property } => {
                format!("'{display_name}' and '{other_property}' do not match.")
            }
            ValidationRule::Custom { .. } => format!("The field {display_name} is invalid."),
        }
    }
}

/// Display and binding hints that do not constrain values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetadataAttribute {
    DisplayName { name: String },
    DataType { data_type: String },
    ReadOnly { read_only: bool },
    ScaffoldColumn { scaffold: bool },
}

impl MetadataAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::DisplayName { .. } => AttributeKind::DisplayName,
            Self::DataType { .. } => AttributeKind::DataType,
            Self::ReadOnly { .. } => AttributeKind::ReadOnly,
            Self::ScaffoldColumn { .. } => AttributeKind::ScaffoldColumn,
        }
    }
}

/// Any attribute attached to a member.
///
/// Serialized flat: `{"kind": "required"}`, `{"kind": "display_name", "name": "Full name"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Validation(ValidationAttribute),
    Metadata(MetadataAttribute),
}

impl Attribute {
    /// Merge key. Parameters are ignored.
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Validation(attribute) => attribute.kind(),
            Self::Metadata(attribute) => attribute.kind(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn as_validation(&self) -> Option<&ValidationAttribute> {
        match self {
            Self::Validation(attribute) => Some(attribute),
            Self::Metadata(_) => None,
        }
    }

    pub fn display_name(name: impl Into<String>) -> Self {
        Self::Metadata(MetadataAttribute::DisplayName { name: name.into() })
    }

    /// Validates declaration-level invariants; metadata attributes always pass.
    pub fn validate_declaration(&self) -> Result<(), AttributeDeclarationError> {
        match self {
            Self::Validation(attribute) => attribute.validate_declaration(),
            Self::Metadata(MetadataAttribute::DisplayName { name }) if name.trim().is_empty() => {
                Err(AttributeDeclarationError::EmptyDisplayName)
            }
            Self::Metadata(_) => Ok(()),
        }
    }
}

impl From<ValidationAttribute> for Attribute {
    fn from(value: ValidationAttribute) -> Self {
        Self::Validation(value)
    }
}

impl From<MetadataAttribute> for Attribute {
    fn from(value: MetadataAttribute) -> Self {
        Self::Metadata(value)
    }
}

/// Invalid attribute declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeDeclarationError {
    InvertedBounds {
        kind: AttributeKind,
        min: f64,
        max: f64,
    },
    NotANumber,
    EmptyPattern,
    InvalidPattern {
        pattern: String,
        reason: String,
    },
    EmptyCompareTarget,
    EmptyCustomName,
    EmptyDisplayName,
}

impl Display for AttributeDeclarationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvertedBounds { kind, min, max } => {
                write!(f, "{kind} declares min ({min}) greater than max ({max})")
            }
            Self::NotANumber => write!(f, "range bounds must be numbers"),
            Self::EmptyPattern => write!(f, "regular_expression pattern must not be empty"),
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "regular_expression pattern `{pattern}` is invalid: {reason}")
            }
            Self::EmptyCompareTarget => write!(f, "compare attribute must name another property"),
            Self::EmptyCustomName => write!(f, "custom attribute name must not be empty"),
            Self::EmptyDisplayName => write!(f, "display_name must not be empty"),
        }
    }
}

impl Error for AttributeDeclarationError {}
