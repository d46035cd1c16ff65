//! # Dependency Model
//!
//! Addressable value slots of a survey and the instructions that produce them.
//!
//! * [`Dependency`]: one `(component, property)` slot in the binding store, e.g. `Q1.value`.
//! * [`Dependent`]: one instruction, identified by its owning component and its own code.
//! * [`ReservedCode`]: the closed set of well-known properties every component may carry.
//!
//! A dependency prints and parses as `"<component>.<property>"`, which is also its serialized
//! form, so a binding store serializes as a flat JSON object.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::tokenizer::keyword::Keyword;

/// Whether `text` reads back as one identifier token of the expression language:
/// a letter or `_`, then letters, digits or `_`, and not a keyword.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && text.parse::<Keyword>().is_err()
}

/// Well-known property slots of a component.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    Display,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservedCode {
    Value,
    Relevance,
    Validity,
    InCurrentNavigation,
    ShowErrors,
    BeforeNavigation,
    AfterNavigation,
    HasPrevious,
    HasNext,
}

impl ReservedCode {
    /// Slots produced only by the runtime context builder, never by an instruction.
    pub fn is_runtime_derived(&self) -> bool {
        matches!(
            self,
            ReservedCode::InCurrentNavigation
                | ReservedCode::ShowErrors
                | ReservedCode::BeforeNavigation
                | ReservedCode::AfterNavigation
                | ReservedCode::HasPrevious
                | ReservedCode::HasNext
        )
    }

    /// Slots whose value is always coerced to a boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            ReservedCode::Relevance
                | ReservedCode::Validity
                | ReservedCode::InCurrentNavigation
                | ReservedCode::ShowErrors
                | ReservedCode::HasPrevious
                | ReservedCode::HasNext
        )
    }
}

/// The property half of a [`Dependency`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Reserved(ReservedCode),
    Custom(String),
}

impl Property {
    pub fn reserved(&self) -> Option<ReservedCode> {
        match self {
            Property::Reserved(code) => Some(*code),
            Property::Custom(_) => None,
        }
    }

    pub fn is_runtime_derived(&self) -> bool {
        self.reserved().is_some_and(|code| code.is_runtime_derived())
    }

    pub fn is_boolean(&self) -> bool {
        self.reserved().is_some_and(|code| code.is_boolean())
    }
}

impl From<ReservedCode> for Property {
    fn from(code: ReservedCode) -> Self {
        Property::Reserved(code)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Reserved(code) => write!(f, "{}", code),
            Property::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Property {
    type Err = DependencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_identifier(s) {
            return Err(DependencyParseError::InvalidProperty(s.to_string()));
        }
        Ok(Property::from_name(s))
    }
}

impl Property {
    /// Reserved property if `name` is one, custom otherwise. Authored targets that are not
    /// identifiers are flagged by the structural check, not here.
    fn from_name(name: &str) -> Self {
        ReservedCode::from_str(name)
            .map(Property::Reserved)
            .unwrap_or_else(|_| Property::Custom(name.to_string()))
    }

    /// Whether this property can be written in an expression.
    pub fn is_addressable(&self) -> bool {
        match self {
            Property::Reserved(_) => true,
            Property::Custom(name) => is_identifier(name),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyParseError {
    #[error("expected <component>.<property>, found '{0}'")]
    MissingSeparator(String),
    #[error("invalid component code '{0}'")]
    InvalidComponent(String),
    #[error("invalid property '{0}'")]
    InvalidProperty(String),
}

/// One addressable value slot: `(component code, property)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
    pub component_code: String,
    pub property: Property,
}

impl Dependency {
    pub fn new(component_code: impl Into<String>, property: impl Into<Property>) -> Self {
        Self {
            component_code: component_code.into(),
            property: property.into(),
        }
    }

    pub fn reserved(component_code: impl Into<String>, code: ReservedCode) -> Self {
        Self::new(component_code, Property::Reserved(code))
    }

    pub fn custom(component_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(component_code, Property::Custom(name.into()))
    }

    pub fn value(component_code: impl Into<String>) -> Self {
        Self::reserved(component_code, ReservedCode::Value)
    }

    pub fn relevance(component_code: impl Into<String>) -> Self {
        Self::reserved(component_code, ReservedCode::Relevance)
    }

    pub fn validity(component_code: impl Into<String>) -> Self {
        Self::reserved(component_code, ReservedCode::Validity)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component_code, self.property)
    }
}

impl FromStr for Dependency {
    type Err = DependencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (component, property) = s
            .split_once('.')
            .ok_or_else(|| DependencyParseError::MissingSeparator(s.to_string()))?;
        if !is_identifier(component) {
            return Err(DependencyParseError::InvalidComponent(component.to_string()));
        }
        Ok(Dependency::new(component, property.parse::<Property>()?))
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Property {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(de::Error::custom(DependencyParseError::InvalidProperty(raw)));
        }
        Ok(Property::from_name(&raw))
    }
}

/// An instruction consuming dependencies: `(owning component code, instruction code)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependent {
    pub component_code: String,
    pub instruction_code: String,
}

impl Dependent {
    pub fn new(component_code: impl Into<String>, instruction_code: impl Into<String>) -> Self {
        Self {
            component_code: component_code.into(),
            instruction_code: instruction_code.into(),
        }
    }
}

impl fmt::Display for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component_code, self.instruction_code)
    }
}
