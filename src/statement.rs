//! A plain structural model of a SQLite `select` statement.
//!
//! A [`Statement`] is assembled by the [`crate::query`] builders and rendered
//! in one pass into SQL text plus the positional bindings for its `?`
//! placeholders. Rendering walks the statement in textual order, so bindings
//! from common table expressions, sub-selects, filters and union members
//! always line up with the placeholders they belong to.

use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A projected or ordered expression: either an identifier to be quoted or raw SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Named(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(String),
    Sub { statement: Box<Statement>, alias: String },
}
impl Source {
    /// The name other clauses use to qualify columns of this source.
    pub fn name(&self) -> &str {
        match self {
            Source::Table(table) => table,
            Source::Sub { alias, .. } => alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { column: String, operator: String, value: Value },
    In { column: String, values: Vec<Value> },
    Null { column: String, negated: bool },
    Raw { sql: String, bindings: Vec<Value> },
    Nested(Vec<Clause>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub boolean: Boolean,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub first: String,
    pub operator: String,
    pub second: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub statement: Statement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: Column,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub ctes: Vec<Cte>,
    pub columns: Vec<Column>,
    pub from: Option<Source>,
    pub joins: Vec<Join>,
    pub wheres: Vec<Clause>,
    pub groups: Vec<String>,
    pub unions: Vec<Statement>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn table(table: &str) -> Self {
        Self {
            from: Some(Source::Table(table.to_string())),
            ..Self::default()
        }
    }
    /// Name of the table (or sub-select alias) this statement selects from.
    pub fn from_name(&self) -> Option<&str> {
        self.from.as_ref().map(Source::name)
    }
    pub fn push_where(&mut self, boolean: Boolean, predicate: Predicate) {
        self.wheres.push(Clause { boolean, predicate });
    }
    /// Adds a predicate that must hold for every row, regardless of any
    /// `or` already present among the filters, raw SQL included.
    pub fn push_and(&mut self, predicate: Predicate) {
        let disjunctive = self
            .wheres
            .iter()
            .any(|c| c.boolean == Boolean::Or || matches!(c.predicate, Predicate::Raw { .. }));
        if disjunctive {
            let existing = std::mem::take(&mut self.wheres);
            self.push_where(Boolean::And, Predicate::Nested(existing));
        }
        self.push_where(Boolean::And, predicate);
    }
    /// Prefixes bare column names with `table`, so they stay unambiguous once
    /// other sources are joined in. Raw SQL is left as written.
    pub fn qualify_columns(&mut self, table: &str) {
        for column in &mut self.columns {
            if let Column::Named(name) = column {
                *name = qualify(name, table);
            }
        }
        qualify_clauses(&mut self.wheres, table);
        for group in &mut self.groups {
            *group = qualify(group, table);
        }
        for order in &mut self.orders {
            if let Column::Named(name) = &mut order.column {
                *name = qualify(name, table);
            }
        }
    }
    /// Renders the statement into SQL text and its positional bindings.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut bindings = Vec::new();
        self.render(&mut sql, &mut bindings);
        (sql, bindings)
    }

    fn render(&self, sql: &mut String, bindings: &mut Vec<Value>) {
        if !self.ctes.is_empty() {
            sql.push_str("with ");
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&quote(&cte.name));
                sql.push_str(" as (");
                cte.statement.render(sql, bindings);
                sql.push(')');
            }
            sql.push(' ');
        }
        sql.push_str("select ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns.iter().map(render_column).collect();
            sql.push_str(&columns.join(", "));
        }
        match &self.from {
            Some(Source::Table(table)) => {
                sql.push_str(" from ");
                sql.push_str(&wrap(table));
            }
            Some(Source::Sub { statement, alias }) => {
                sql.push_str(" from (");
                statement.render(sql, bindings);
                sql.push_str(") as ");
                sql.push_str(&quote(alias));
            }
            None => {}
        }
        for join in &self.joins {
            sql.push_str(match join.kind {
                JoinKind::Inner => " inner join ",
                JoinKind::Left => " left join ",
            });
            sql.push_str(&wrap(&join.table));
            sql.push_str(" on ");
            sql.push_str(&wrap(&join.first));
            sql.push(' ');
            sql.push_str(&join.operator);
            sql.push(' ');
            sql.push_str(&wrap(&join.second));
        }
        if !self.wheres.is_empty() {
            sql.push_str(" where ");
            render_clauses(&self.wheres, sql, bindings);
        }
        if !self.groups.is_empty() {
            let groups: Vec<String> = self.groups.iter().map(|g| wrap(g)).collect();
            sql.push_str(" group by ");
            sql.push_str(&groups.join(", "));
        }
        for member in &self.unions {
            sql.push_str(" union all ");
            if member.is_compound_member() {
                member.render(sql, bindings);
            } else {
                // SQLite rejects ordering, limits and CTEs inside compound members
                sql.push_str("select * from (");
                member.render(sql, bindings);
                sql.push(')');
            }
        }
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|o| {
                    let direction = match o.direction {
                        Direction::Asc => "asc",
                        Direction::Desc => "desc",
                    };
                    format!("{} {}", render_column(&o.column), direction)
                })
                .collect();
            sql.push_str(" order by ");
            sql.push_str(&orders.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" limit {limit} offset {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" limit {limit}")),
            // SQLite only accepts an offset after a limit
            (None, Some(offset)) => sql.push_str(&format!(" limit -1 offset {offset}")),
            (None, None) => {}
        }
    }

    fn is_compound_member(&self) -> bool {
        self.ctes.is_empty() && self.orders.is_empty() && self.limit.is_none() && self.offset.is_none()
    }
}

fn render_clauses(clauses: &[Clause], sql: &mut String, bindings: &mut Vec<Value>) {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            sql.push_str(match clause.boolean {
                Boolean::And => " and ",
                Boolean::Or => " or ",
            });
        }
        match &clause.predicate {
            Predicate::Compare { column, operator, value } => {
                sql.push_str(&format!("{} {} ?", wrap(column), operator));
                bindings.push(value.clone());
            }
            Predicate::In { column, values } => {
                if values.is_empty() {
                    sql.push_str("0 = 1");
                } else {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!("{} in ({})", wrap(column), placeholders));
                    bindings.extend(values.iter().cloned());
                }
            }
            Predicate::Null { column, negated } => {
                sql.push_str(&wrap(column));
                sql.push_str(if *negated { " is not null" } else { " is null" });
            }
            Predicate::Raw { sql: raw, bindings: raw_bindings } => {
                sql.push_str(raw);
                bindings.extend(raw_bindings.iter().cloned());
            }
            Predicate::Nested(inner) => {
                sql.push('(');
                render_clauses(inner, sql, bindings);
                sql.push(')');
            }
        }
    }
}

fn qualify_clauses(clauses: &mut [Clause], table: &str) {
    for clause in clauses {
        match &mut clause.predicate {
            Predicate::Compare { column, .. } | Predicate::In { column, .. } | Predicate::Null { column, .. } => {
                *column = qualify(column, table);
            }
            Predicate::Nested(inner) => qualify_clauses(inner, table),
            Predicate::Raw { .. } => {}
        }
    }
}

fn qualify(column: &str, table: &str) -> String {
    if column.contains('.') || column.contains('(') {
        column.to_string()
    } else {
        format!("{table}.{column}")
    }
}

fn render_column(column: &Column) -> String {
    match column {
        Column::Named(name) => wrap(name),
        Column::Raw(raw) => raw.clone(),
    }
}

/// Quotes a single identifier.
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quotes a possibly qualified and possibly aliased identifier, e.g.
/// `posts.id as post_id` becomes `"posts"."id" as "post_id"`.
pub fn wrap(identifier: &str) -> String {
    let lowered = identifier.to_ascii_lowercase();
    if let Some(position) = lowered.find(" as ") {
        let (name, alias) = (&identifier[..position], &identifier[position + 4..]);
        return format!("{} as {}", wrap(name.trim()), quote(alias.trim()));
    }
    identifier
        .split('.')
        .map(|segment| if segment == "*" { segment.to_string() } else { quote(segment) })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_qualified_and_aliased_identifiers() {
        assert_eq!(wrap("id"), "\"id\"");
        assert_eq!(wrap("posts.*"), "\"posts\".*");
        assert_eq!(wrap("posts.id AS post_id"), "\"posts\".\"id\" as \"post_id\"");
        assert_eq!(quote("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn plain_select_renders_star() {
        let (sql, bindings) = Statement::table("users").to_sql();
        assert_eq!(sql, "select * from \"users\"");
        assert!(bindings.is_empty());
    }

    #[test]
    fn bindings_follow_textual_order() {
        let mut cte = Statement::table("tags");
        cte.push_where(
            Boolean::And,
            Predicate::Compare { column: "name".into(), operator: "=".into(), value: Value::Text("a".into()) },
        );
        let mut statement = Statement::table("users");
        statement.ctes.push(Cte { name: "t".into(), statement: cte });
        statement.push_where(
            Boolean::And,
            Predicate::Compare { column: "age".into(), operator: ">".into(), value: Value::Integer(3) },
        );
        let (sql, bindings) = statement.to_sql();
        assert_eq!(
            sql,
            "with \"t\" as (select * from \"tags\" where \"name\" = ?) select * from \"users\" where \"age\" > ?"
        );
        assert_eq!(bindings, vec![Value::Text("a".into()), Value::Integer(3)]);
    }

    #[test]
    fn push_and_groups_existing_disjunction() {
        let mut statement = Statement::table("users");
        statement.push_where(Boolean::And, Predicate::Null { column: "a".into(), negated: false });
        statement.push_where(Boolean::Or, Predicate::Null { column: "b".into(), negated: false });
        statement.push_and(Predicate::Null { column: "users.deleted_at".into(), negated: false });
        let (sql, _) = statement.to_sql();
        assert_eq!(
            sql,
            "select * from \"users\" where (\"a\" is null or \"b\" is null) and \"users\".\"deleted_at\" is null"
        );
    }

    #[test]
    fn push_and_groups_existing_raw_sql() {
        let mut statement = Statement::table("users");
        statement.push_where(Boolean::And, Predicate::Raw { sql: "a = 1 or b = 2".into(), bindings: vec![] });
        statement.push_and(Predicate::Null { column: "users.deleted_at".into(), negated: false });
        assert_eq!(
            statement.to_sql().0,
            "select * from \"users\" where (a = 1 or b = 2) and \"users\".\"deleted_at\" is null"
        );
    }

    #[test]
    fn qualify_columns_prefixes_bare_names_only() {
        let mut statement = Statement::table("users");
        statement.columns.push(Column::Named("name as label".into()));
        statement.columns.push(Column::Raw("count(*)".into()));
        statement.push_where(
            Boolean::And,
            Predicate::Compare { column: "id".into(), operator: ">".into(), value: Value::Integer(0) },
        );
        statement.push_where(
            Boolean::Or,
            Predicate::Nested(vec![Clause {
                boolean: Boolean::And,
                predicate: Predicate::Null { column: "teams.id".into(), negated: true },
            }]),
        );
        statement.orders.push(Order { column: Column::Named("name".into()), direction: Direction::Asc });
        statement.qualify_columns("users");
        assert_eq!(
            statement.to_sql().0,
            "select \"users\".\"name\" as \"label\", count(*) from \"users\" \
             where \"users\".\"id\" > ? or (\"teams\".\"id\" is not null) order by \"users\".\"name\" asc"
        );
    }

    #[test]
    fn ordered_union_member_is_wrapped() {
        let mut member = Statement::table("b");
        member.limit = Some(2);
        let mut statement = Statement::table("a");
        statement.unions.push(member);
        statement.unions.push(Statement::table("c"));
        let (sql, _) = statement.to_sql();
        assert_eq!(
            sql,
            "select * from \"a\" union all select * from (select * from \"b\" limit 2) union all select * from \"c\""
        );
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut statement = Statement::table("a");
        statement.push_where(Boolean::And, Predicate::In { column: "id".into(), values: vec![] });
        assert_eq!(statement.to_sql().0, "select * from \"a\" where 0 = 1");
    }
}
