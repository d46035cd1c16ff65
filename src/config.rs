use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

use crate::navigation::NavigationMode;
use crate::survey::ComponentKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub navigation_mode: NavigationMode,

    #[serde(default)]
    pub codes: CodeConvention,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            navigation_mode: NavigationMode::default(),
            codes: CodeConvention::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Prefix convention that classifies component codes (`G1` is a group, `Q1` a question).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeConvention {
    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,

    #[serde(default = "default_question_prefix")]
    pub question_prefix: String,

    #[serde(default = "default_answer_prefix")]
    pub answer_prefix: String,
}

impl Default for CodeConvention {
    fn default() -> Self {
        Self {
            group_prefix: default_group_prefix(),
            question_prefix: default_question_prefix(),
            answer_prefix: default_answer_prefix(),
        }
    }
}

impl CodeConvention {
    /// Compile the prefixes into matchers; fails on an empty prefix.
    pub fn matcher(&self) -> ConfigResult<CodeMatcher> {
        Ok(CodeMatcher {
            group: prefix_regex(&self.group_prefix)?,
            question: prefix_regex(&self.question_prefix)?,
            answer: prefix_regex(&self.answer_prefix)?,
        })
    }
}

fn prefix_regex(prefix: &str) -> ConfigResult<regex::Regex> {
    if prefix.is_empty() {
        return Err(ConfigError::Invalid("code prefix must not be empty".to_string()));
    }
    let pattern = format!("^{}[A-Za-z0-9_]+$", regex::escape(prefix));
    regex::Regex::new(&pattern).map_err(|e| ConfigError::Invalid(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct CodeMatcher {
    group: regex::Regex,
    question: regex::Regex,
    answer: regex::Regex,
}

impl CodeMatcher {
    pub fn kind_of(&self, code: &str) -> ComponentKind {
        if self.question.is_match(code) {
            ComponentKind::Question
        } else if self.group.is_match(code) {
            ComponentKind::Group
        } else if self.answer.is_match(code) {
            ComponentKind::Answer
        } else {
            ComponentKind::Other
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    #[serde(default = "default_max_script_length")]
    pub max_script_length: usize,

    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    #[serde(default = "default_true")]
    pub block_next_on_invalid: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_script_length: default_max_script_length(),
            max_call_depth: default_max_call_depth(),
            block_next_on_invalid: default_true(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> ConfigResult<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> ConfigResult<T> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

fn default_group_prefix() -> String {
    "G".to_string()
}

fn default_question_prefix() -> String {
    "Q".to_string()
}

fn default_answer_prefix() -> String {
    "A".to_string()
}

fn default_max_script_length() -> usize {
    10_000
}

fn default_max_call_depth() -> usize {
    64
}

fn default_true() -> bool {
    true
}
