//! Query grading.
//!
//! Judges a player's query against a [`FloorSpec`] using the strategy the
//! floor selects. Grading never fails: unparseable or failing queries simply
//! produce empty results, which then compare like any other result.

use super::floor::{FloorSpec, GradingStrategy, SpecialValidation};
use super::normalize::ResultNormalizer;
use crate::questql::sql::execution::engine::SqlEmulator;
use crate::questql::sql::execution::types::Database;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::LazyLock;

static JOIN_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bJOIN\b.+\bON\b").expect("static regex is valid"));
static GROUP_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").expect("static regex is valid"));
static HAVING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bHAVING\b").expect("static regex is valid"));
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("static regex is valid"));

/// Outcome of grading one query.
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub passed: bool,
    pub strategy: &'static str,
    /// Rows the player's query produced
    pub actual_rows: usize,
    /// Rows the reference answer produced, for the answer strategy
    pub expected_rows: Option<usize>,
    pub notes: Vec<String>,
}

impl GradeReport {
    fn new(strategy: &GradingStrategy) -> Self {
        Self {
            passed: false,
            strategy: strategy.name(),
            actual_rows: 0,
            expected_rows: None,
            notes: Vec::new(),
        }
    }
}

pub struct QueryValidator<'e> {
    emulator: &'e SqlEmulator,
}

impl<'e> QueryValidator<'e> {
    pub fn new(emulator: &'e SqlEmulator) -> Self {
        Self { emulator }
    }

    pub fn validate(&self, query: &str, floor: &FloorSpec, database: &Database) -> bool {
        self.grade(query, floor, database).passed
    }

    /// Grades `query` and reports how the verdict was reached.
    pub fn grade(&self, query: &str, floor: &FloorSpec, database: &Database) -> GradeReport {
        let strategy = floor.strategy();
        let mut report = GradeReport::new(&strategy);

        match strategy {
            GradingStrategy::Answer(answer) => {
                let expected = self.emulator.emulate(answer, database);
                let actual = self.emulator.emulate(query, database);
                report.expected_rows = Some(expected.len());
                report.actual_rows = actual.len();
                report.passed = ResultNormalizer::equivalent(&actual, &expected);
                if !report.passed {
                    report.notes.push(format!(
                        "expected {}, got {}",
                        ResultNormalizer::canonical_form(&expected),
                        ResultNormalizer::canonical_form(&actual)
                    ));
                }
            }
            GradingStrategy::Special(special) => {
                let shape_ok = match special {
                    SpecialValidation::JoinQuery => JOIN_ON.is_match(query),
                    SpecialValidation::BossQuery => {
                        GROUP_BY.is_match(query) && HAVING.is_match(query) && ORDER_BY.is_match(query)
                    }
                };
                if shape_ok {
                    report.actual_rows = self.emulator.emulate(query, database).len();
                    report.passed = report.actual_rows > 0;
                } else {
                    report.notes.push("query lacks the required clauses".to_string());
                }
            }
            GradingStrategy::Patterns(patterns) => {
                report.passed = true;
                for pattern in patterns {
                    match RegexBuilder::new(pattern).case_insensitive(true).build() {
                        Ok(re) if re.is_match(query) => {}
                        Ok(_) => {
                            report.passed = false;
                            report.notes.push(format!("pattern not matched: {}", pattern));
                        }
                        Err(e) => {
                            log::warn!("Invalid floor pattern '{}': {}", pattern, e);
                            report.passed = false;
                            report.notes.push(format!("invalid pattern: {}", pattern));
                        }
                    }
                }
            }
            GradingStrategy::Reject => {
                report.notes.push("floor has no grading strategy".to_string());
            }
        }

        log::debug!(
            "Graded with {}: {}",
            report.strategy,
            if report.passed { "pass" } else { "fail" }
        );
        report
    }
}

/// Grades `query` with the built-in emulator.
pub fn validate(query: &str, floor: &FloorSpec, database: &Database) -> bool {
    let emulator = SqlEmulator::with_builtins();
    QueryValidator::new(&emulator).validate(query, floor, database)
}
