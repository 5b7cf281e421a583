//! Composition of weighted conditions into one ranked query.
//!
//! Every registered condition yields `(id, score)` rows. These are unioned
//! (without deduplication) behind a `(null, 0)` seed row, summed per id in a
//! common table expression, and joined back onto the base query:
//!
//! ```text
//! with "id_and_total_score" as (
//!     select "ids_and_scores"."id" as "id", sum("ids_and_scores"."score") as score
//!     from (select null as id, 0 as score union all <condition> union all ...) as "ids_and_scores"
//!     group by "id"
//! )
//! select "posts".*, "id_and_total_score"."score" as "total_score" from "posts"
//! left join "id_and_total_score" on "id_and_total_score"."id" = "posts"."id"
//! where "posts"."id" in (select "id" from "id_and_total_score")
//! order by "id_and_total_score"."score" desc
//! ```
//!
//! With no conditions registered only the seed row exists, so nothing matches.

use std::collections::HashSet;
use std::hash::BuildHasherDefault;
use std::marker::PhantomData;

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::Connection;
use seahash::SeaHasher;
use tracing::debug;

use crate::condition::Condition;
use crate::error::Result;
use crate::model::{Model, Ranked};
use crate::query::{ModelQuery, Query, Scopes};
use crate::settings::Settings;
use crate::statement::{quote, wrap, Column, Cte, Direction, Join, JoinKind, Order, Predicate, Source, Statement};

type TermHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    static ref TERM_SEPARATORS: Regex = Regex::new(r"[-_.]").unwrap();
}

/// Splits free text into unique search terms, in order of first appearance.
/// `-`, `_` and `.` separate terms just like whitespace does.
pub fn split_terms(terms: &str) -> Vec<String> {
    let normalized = TERM_SEPARATORS.replace_all(terms, " ");
    let mut seen: HashSet<&str, TermHasher> = HashSet::default();
    normalized
        .split_whitespace()
        .filter(|term| seen.insert(*term))
        .map(str::to_string)
        .collect()
}

/// Score given to the condition at `index` when it has none of its own.
/// Earlier registrations weigh more: `count - index`.
pub fn fallback_score(count: usize, index: usize) -> i64 {
    count as i64 - index as i64
}

pub struct SearchBuilder<M: Model> {
    base: Option<Statement>,
    conditions: Vec<Condition>,
    settings: Settings,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> SearchBuilder<M> {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }
    pub fn with_settings(settings: Settings) -> Self {
        Self { base: None, conditions: Vec::new(), settings, model: PhantomData }
    }
    /// Sets the query the ranked rows are drawn from, replacing any earlier one.
    /// Its global scopes stay in force. Bare column names are qualified with
    /// its table when the search is built; raw SQL must qualify its own.
    pub fn set_query(&mut self, query: impl Query) -> &mut Self {
        self.base = Some(query.compile(Scopes::Apply));
        self
    }
    /// Registers a condition sub-query. It must select the row identifier as
    /// its only column; `score` of `None` falls back to registration order.
    pub fn search(&mut self, query: impl Query, score: Option<i64>) -> &mut Self {
        self.conditions.push(Condition::new(query).score(score));
        self
    }
    /// Calls `callback` once per unique term of `terms`, so a condition can be
    /// registered per term.
    pub fn split_terms<F>(&mut self, terms: &str, mut callback: F) -> &mut Self
    where
        F: FnMut(&mut Self, &str),
    {
        for term in split_terms(terms) {
            callback(self, &term);
        }
        self
    }
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The base query ranked by total score, ready for further filtering or
    /// execution. Building leaves the builder untouched.
    pub fn build_query(&self) -> ModelQuery<M> {
        let mut statement = match &self.base {
            Some(base) => base.clone(),
            None => M::query().compile(Scopes::Apply),
        };
        let table = statement.from_name().unwrap_or(M::TABLE).to_string();
        let key = format!("{table}.{}", M::KEY);
        let cte = &self.settings.cte_name;
        debug!(table = %table, conditions = self.conditions.len(), "building search query");

        // the joined scores bring their own `id` and `score`
        statement.qualify_columns(&table);

        if statement.columns.is_empty() {
            statement.columns.push(Column::Named(format!("{table}.*")));
        }
        statement
            .columns
            .push(Column::Named(format!("{cte}.score as {}", self.settings.score_alias)));
        statement.ctes.push(Cte { name: cte.clone(), statement: self.score_query() });
        statement.joins.push(Join {
            kind: JoinKind::Left,
            table: cte.clone(),
            first: format!("{cte}.id"),
            operator: "=".to_string(),
            second: key.clone(),
        });
        statement.push_and(Predicate::Raw {
            sql: format!("{} in (select {} from {})", wrap(&key), quote("id"), quote(cte)),
            bindings: Vec::new(),
        });
        statement.orders.push(Order {
            column: Column::Named(format!("{cte}.score")),
            direction: Direction::Desc,
        });
        ModelQuery::from_compiled(statement)
    }

    /// Executes the ranked query, best match first.
    pub fn fetch(&self, connection: &Connection) -> Result<Vec<Ranked<M>>> {
        let alias = self.settings.score_alias.as_str();
        let hits = self.build_query().fetch_rows(connection, |row| {
            Ok(Ranked { score: row.get(alias)?, record: M::from_row(row)? })
        })?;
        Ok(hits)
    }

    /// `(id, summed score)` per identifier over every condition.
    fn score_query(&self) -> Statement {
        let mut union = Statement::new();
        union.columns.push(Column::Raw("null as id".to_string()));
        union.columns.push(Column::Raw("0 as score".to_string()));
        let count = self.conditions.len();
        for (index, condition) in self.conditions.iter().enumerate() {
            union.unions.push(condition.apply_score(fallback_score(count, index)));
        }
        let alias = &self.settings.union_alias;
        Statement {
            columns: vec![
                Column::Named(format!("{alias}.id as id")),
                Column::Raw(format!("sum({}) as score", wrap(&format!("{alias}.score")))),
            ],
            from: Some(Source::Sub { statement: Box::new(union), alias: alias.clone() }),
            groups: vec!["id".to_string()],
            ..Statement::default()
        }
    }
}

impl<M: Model> Default for SearchBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}
