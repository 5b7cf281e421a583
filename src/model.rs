use rusqlite::Row;

use crate::builder::SearchBuilder;
use crate::query::ModelQuery;
use crate::statement::{Boolean, Clause, Predicate};

/// A table-backed record type that can be searched.
///
/// `global_scopes` are predicates attached to every query of the model
/// (soft-delete exclusion being the usual one). They are applied when a
/// query is compiled with [`crate::query::Scopes::Apply`] and left out with
/// [`crate::query::Scopes::Ignore`].
pub trait Model: Sized {
    const TABLE: &'static str;
    const KEY: &'static str = "id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn global_scopes() -> Vec<Scope> {
        Vec::new()
    }
    fn query() -> ModelQuery<Self> {
        ModelQuery::new()
    }
    /// A search builder pre-configured for the model.
    fn search_builder() -> SearchBuilder<Self> {
        SearchBuilder::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Rows with a non-null deletion marker are hidden.
    SoftDeletes { column: &'static str },
    /// Arbitrary SQL predicate, written against unqualified columns at your own risk.
    Raw(&'static str),
}
impl Scope {
    pub fn soft_deletes() -> Self {
        Scope::SoftDeletes { column: "deleted_at" }
    }
    pub fn predicate(&self, table: &str) -> Predicate {
        match self {
            Scope::SoftDeletes { column } => Predicate::Null {
                column: format!("{table}.{column}"),
                negated: false,
            },
            // nested so a raw `a or b` cannot leak out of its scope
            Scope::Raw(sql) => Predicate::Nested(vec![Clause {
                boolean: Boolean::And,
                predicate: Predicate::Raw { sql: sql.to_string(), bindings: Vec::new() },
            }]),
        }
    }
}

/// A hydrated record together with its summed search score.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<M> {
    pub record: M,
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Statement;

    #[test]
    fn scopes_qualify_or_nest_their_predicates() {
        let mut statement = Statement::table("posts");
        statement.push_and(Scope::soft_deletes().predicate("posts"));
        statement.push_and(Scope::Raw("published = 1 or draft = 0").predicate("posts"));
        assert_eq!(
            statement.to_sql().0,
            "select * from \"posts\" where \"posts\".\"deleted_at\" is null and (published = 1 or draft = 0)"
        );
    }
}
