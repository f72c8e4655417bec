//! Request classification
//!
//! This module derives the descriptive attributes of a request:
//! - Browser and operating system from the user agent, via ordered rule tables
//! - File type from the URI stem

mod agent;
mod file_type;

pub use agent::{
    AgentClassifier, Classification, PatternSpec, RuleTable, BROWSER_RULES, OS_RULES, UNKNOWN,
};
pub use file_type::{file_type, NO_FILE_TYPE};

use std::sync::OnceLock;

static BUILTIN: OnceLock<AgentClassifier> = OnceLock::new();

/// The classifier for the built-in rule tables, compiled on first use
pub fn builtin_classifier() -> &'static AgentClassifier {
    BUILTIN.get_or_init(AgentClassifier::builtin)
}

/// Classifies a user agent with the built-in rule tables
pub fn classify(user_agent: &str) -> Classification {
    builtin_classifier().classify(user_agent)
}
