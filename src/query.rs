//! Fluent query builders over [`Statement`].
//!
//! [`Query`] is the capability set the search composition needs: projecting,
//! filtering, joining, unioning, sub-selecting and executing. It has two
//! implementations: [`RawQuery`], which knows nothing about models, and
//! [`ModelQuery`], which is bound to a [`Model`] and carries its global scopes.
//!
//! Implicit predicates are never ambient state. Whether they are applied is an
//! explicit argument to [`Query::compile`].

use std::fmt;
use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use tracing::{debug, trace};

use crate::error::Result;
use crate::model::Model;
use crate::statement::{Boolean, Clause, Column, Cte, Direction, Join, JoinKind, Order, Predicate, Source, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scopes {
    Apply,
    Ignore,
}

/// Values that can be bound to a `?` placeholder.
pub trait Bindable {
    fn into_value(self) -> Value;
}
macro_rules! bindable_integer {
    ($($ty:ty),*) => {
        $(impl Bindable for $ty {
            fn into_value(self) -> Value { Value::Integer(i64::from(self)) }
        })*
    };
}
bindable_integer!(i8, i16, i32, i64, u8, u16, u32, bool);
impl Bindable for f64 {
    fn into_value(self) -> Value { Value::Real(self) }
}
impl Bindable for &str {
    fn into_value(self) -> Value { Value::Text(self.to_string()) }
}
impl Bindable for String {
    fn into_value(self) -> Value { Value::Text(self) }
}
impl Bindable for Value {
    fn into_value(self) -> Value { self }
}
impl<T: Bindable> Bindable for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, Bindable::into_value)
    }
}

pub trait Query: Sized {
    fn statement(&self) -> &Statement;
    fn statement_mut(&mut self) -> &mut Statement;
    /// The statement to execute, with or without the implicit scopes.
    fn compile(&self, scopes: Scopes) -> Statement;

    fn select(mut self, columns: &[&str]) -> Self {
        let statement = self.statement_mut();
        statement.columns.extend(columns.iter().map(|c| Column::Named(c.to_string())));
        self
    }
    fn select_raw(mut self, expression: &str) -> Self {
        self.statement_mut().columns.push(Column::Raw(expression.to_string()));
        self
    }
    fn where_op(mut self, column: &str, operator: &str, value: impl Bindable) -> Self {
        self.statement_mut().push_where(
            Boolean::And,
            Predicate::Compare { column: column.to_string(), operator: operator.to_string(), value: value.into_value() },
        );
        self
    }
    fn where_eq(self, column: &str, value: impl Bindable) -> Self {
        self.where_op(column, "=", value)
    }
    fn or_where(mut self, column: &str, operator: &str, value: impl Bindable) -> Self {
        self.statement_mut().push_where(
            Boolean::Or,
            Predicate::Compare { column: column.to_string(), operator: operator.to_string(), value: value.into_value() },
        );
        self
    }
    fn where_in<V: Bindable>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Bindable::into_value).collect();
        self.statement_mut()
            .push_where(Boolean::And, Predicate::In { column: column.to_string(), values });
        self
    }
    fn where_null(mut self, column: &str) -> Self {
        self.statement_mut()
            .push_where(Boolean::And, Predicate::Null { column: column.to_string(), negated: false });
        self
    }
    fn where_not_null(mut self, column: &str) -> Self {
        self.statement_mut()
            .push_where(Boolean::And, Predicate::Null { column: column.to_string(), negated: true });
        self
    }
    /// Raw SQL is kept in its own parentheses, so an `or` inside it cannot
    /// swallow the filters added after it.
    fn where_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        let raw = Clause { boolean: Boolean::And, predicate: Predicate::Raw { sql: sql.to_string(), bindings } };
        self.statement_mut().push_where(Boolean::And, Predicate::Nested(vec![raw]));
        self
    }
    fn join(mut self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.statement_mut().joins.push(Join {
            kind: JoinKind::Inner,
            table: table.to_string(),
            first: first.to_string(),
            operator: operator.to_string(),
            second: second.to_string(),
        });
        self
    }
    fn left_join(mut self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.statement_mut().joins.push(Join {
            kind: JoinKind::Left,
            table: table.to_string(),
            first: first.to_string(),
            operator: operator.to_string(),
            second: second.to_string(),
        });
        self
    }
    /// Appends `other` with `union all`, keeping duplicate rows.
    fn union_all(mut self, other: impl Query) -> Self {
        self.statement_mut().unions.push(other.compile(Scopes::Apply));
        self
    }
    fn with_expression(mut self, name: &str, query: impl Query) -> Self {
        self.statement_mut()
            .ctes
            .push(Cte { name: name.to_string(), statement: query.compile(Scopes::Apply) });
        self
    }
    fn from_sub(mut self, query: impl Query, alias: &str) -> Self {
        self.statement_mut().from = Some(Source::Sub {
            statement: Box::new(query.compile(Scopes::Apply)),
            alias: alias.to_string(),
        });
        self
    }
    fn group_by(mut self, columns: &[&str]) -> Self {
        self.statement_mut().groups.extend(columns.iter().map(|c| c.to_string()));
        self
    }
    fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.statement_mut()
            .orders
            .push(Order { column: Column::Named(column.to_string()), direction });
        self
    }
    fn order_by_raw(mut self, expression: &str, direction: Direction) -> Self {
        self.statement_mut()
            .orders
            .push(Order { column: Column::Raw(expression.to_string()), direction });
        self
    }
    fn limit(mut self, limit: u64) -> Self {
        self.statement_mut().limit = Some(limit);
        self
    }
    fn offset(mut self, offset: u64) -> Self {
        self.statement_mut().offset = Some(offset);
        self
    }

    fn to_sql(&self) -> String {
        self.compile(Scopes::Apply).to_sql().0
    }
    fn bindings(&self) -> Vec<Value> {
        self.compile(Scopes::Apply).to_sql().1
    }
    /// Executes the query and maps every row through `map`.
    fn fetch_rows<T, F>(&self, connection: &Connection, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let (sql, bindings) = self.compile(Scopes::Apply).to_sql();
        trace!(%sql, bindings = bindings.len(), "executing query");
        let mut statement = connection.prepare(&sql)?;
        let rows = statement
            .query_map(params_from_iter(bindings.iter()), map)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        debug!(rows = rows.len(), "query executed");
        Ok(rows)
    }
}

// ------------- RawQuery -------------
/// A query not bound to any model, the equivalent of a bare `select`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawQuery {
    statement: Statement,
}
impl RawQuery {
    /// A query without a `from` clause.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn table(table: &str) -> Self {
        Self { statement: Statement::table(table) }
    }
}
impl Query for RawQuery {
    fn statement(&self) -> &Statement {
        &self.statement
    }
    fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }
    fn compile(&self, _scopes: Scopes) -> Statement {
        self.statement.clone()
    }
}

// ------------- ModelQuery -------------
pub struct ModelQuery<M: Model> {
    statement: Statement,
    scoped: bool,
    model: PhantomData<fn() -> M>,
}
impl<M: Model> ModelQuery<M> {
    pub fn new() -> Self {
        Self { statement: Statement::table(M::TABLE), scoped: true, model: PhantomData }
    }
    /// Wraps a statement whose scopes, if any, are already part of its filters.
    pub fn from_compiled(statement: Statement) -> Self {
        Self { statement, scoped: false, model: PhantomData }
    }
    /// Drops the model's global scopes for good, regardless of how it is compiled.
    pub fn without_global_scopes(mut self) -> Self {
        self.scoped = false;
        self
    }
    /// Executes the query and hydrates every row into the model.
    pub fn get(&self, connection: &Connection) -> Result<Vec<M>> {
        self.fetch_rows(connection, M::from_row)
    }
}
impl<M: Model> Default for ModelQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}
impl<M: Model> Clone for ModelQuery<M> {
    fn clone(&self) -> Self {
        Self { statement: self.statement.clone(), scoped: self.scoped, model: PhantomData }
    }
}
impl<M: Model> fmt::Debug for ModelQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModelQuery")
            .field("model", &M::TABLE)
            .field("scoped", &self.scoped)
            .field("statement", &self.statement)
            .finish()
    }
}
impl<M: Model> Query for ModelQuery<M> {
    fn statement(&self) -> &Statement {
        &self.statement
    }
    fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }
    fn compile(&self, scopes: Scopes) -> Statement {
        let mut statement = self.statement.clone();
        if scopes == Scopes::Apply && self.scoped {
            let table = statement.from_name().unwrap_or(M::TABLE).to_string();
            for scope in M::global_scopes() {
                statement.push_and(scope.predicate(&table));
            }
        }
        statement
    }
}
