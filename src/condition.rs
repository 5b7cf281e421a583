use crate::query::{Query, Scopes};
use crate::statement::{Column, Statement};

/// One weighted match rule: a sub-select yielding row identifiers, plus the
/// score every identifier it yields contributes to the total.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    query: Statement,
    score: Option<i64>,
}

impl Condition {
    /// The query is compiled without its global scopes. Filters like soft
    /// deletion keep the scoring sub-select from using covering indexes, and
    /// the base query applies them to the final rows anyway.
    pub fn new(query: impl Query) -> Self {
        Self { query: query.compile(Scopes::Ignore), score: None }
    }
    pub fn score(mut self, score: Option<i64>) -> Self {
        self.score = score;
        self
    }
    pub fn query(&self) -> &Statement {
        &self.query
    }
    pub fn explicit_score(&self) -> Option<i64> {
        self.score
    }
    pub fn resolve_score(&self, fallback_score: i64) -> i64 {
        self.score.unwrap_or(fallback_score)
    }
    /// The condition's query with its resolved score projected as a trailing
    /// `score` column. The condition itself is left untouched.
    pub fn apply_score(&self, fallback_score: i64) -> Statement {
        let mut scored = self.query.clone();
        scored
            .columns
            .push(Column::Raw(format!("{} as score", self.resolve_score(fallback_score))));
        scored
    }
}
