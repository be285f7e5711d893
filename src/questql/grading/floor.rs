//! Floor grading specifications.
//!
//! A floor states how a player's query is judged. Strategies, in precedence
//! order:
//!
//! 1. `answer` - a reference query; the player's result must match its result
//!    once both are normalised
//! 2. `specialValidation` - a fixed structural check (`joinQuery`, `bossQuery`)
//! 3. `patterns` - regular expressions that must all match the query text
//!
//! A floor with none of these rejects every query.
//!
//! ```yaml
//! answer: SELECT name FROM heroes WHERE level > 10
//! patterns:
//!   - "\\bWHERE\\b"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FloorSpec {
    pub answer: Option<String>,
    pub patterns: Vec<String>,
    #[serde(alias = "special_validation")]
    pub special_validation: Option<SpecialValidation>,
}

/// Hard-coded structural graders kept for older floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialValidation {
    /// `JOIN ... ON` present and a non-empty result
    #[serde(alias = "join_query")]
    JoinQuery,
    /// GROUP BY, HAVING and ORDER BY present and a non-empty result
    #[serde(alias = "boss_query")]
    BossQuery,
}

/// The strategy a floor grades with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingStrategy<'a> {
    Answer(&'a str),
    Special(SpecialValidation),
    Patterns(&'a [String]),
    Reject,
}

impl GradingStrategy<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            GradingStrategy::Answer(_) => "answer",
            GradingStrategy::Special(SpecialValidation::JoinQuery) => "join_query",
            GradingStrategy::Special(SpecialValidation::BossQuery) => "boss_query",
            GradingStrategy::Patterns(_) => "patterns",
            GradingStrategy::Reject => "reject",
        }
    }
}

impl FloorSpec {
    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::default()
        }
    }

    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_special(special: SpecialValidation) -> Self {
        Self {
            special_validation: Some(special),
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> GradingStrategy<'_> {
        if let Some(answer) = self.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            GradingStrategy::Answer(answer)
        } else if let Some(special) = self.special_validation {
            GradingStrategy::Special(special)
        } else if !self.patterns.is_empty() {
            GradingStrategy::Patterns(&self.patterns)
        } else {
            GradingStrategy::Reject
        }
    }
}
