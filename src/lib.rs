//! Searchbuilder – weighted multi-condition search over SQLite, composed into a single query.
//!
//! A search is a set of *conditions*: sub-queries that each select the
//! identifiers of the rows they match. Every condition carries a score. The
//! identifiers of all conditions are unioned, scores are summed per identifier
//! and the original rows are returned best match first. Matching on a name, a
//! tag and a description, each weighted differently, needs no search engine.
//!
//! ## Modules
//! * [`statement`] – Structural model of a `select`, rendered to SQL plus bindings.
//! * [`query`] – The [`query::Query`] builder trait with [`query::RawQuery`] and
//!   model-bound [`query::ModelQuery`] implementations.
//! * [`model`] – The [`model::Model`] trait, global scopes and ranked results.
//! * [`condition`] – One weighted condition and its score projection.
//! * [`builder`] – The [`builder::SearchBuilder`] composing conditions into a scoring CTE.
//! * [`settings`] – Names used in the generated SQL, loadable through `config`.
//!
//! ## Scores
//! A condition registered without a score gets `count - index`, so with three
//! conditions the first weighs 3, the second 2 and the last 1. Explicit scores
//! are always kept as given.
//!
//! ## Global Scopes
//! Models may declare scopes such as soft deletion. Conditions are compiled
//! without them, while the base query keeps them, so a soft-deleted row can
//! match a condition but never shows up in the results.
//!
//! ## Quick Start
//! ```
//! use rusqlite::{Connection, Row};
//! use searchbuilder::model::Model;
//! use searchbuilder::query::Query;
//!
//! struct Product { id: i64, name: String }
//! impl Model for Product {
//!     const TABLE: &'static str = "products";
//!     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
//!         Ok(Product { id: row.get("id")?, name: row.get("name")? })
//!     }
//! }
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch("
//!     create table products (id integer primary key, name text, tag text);
//!     insert into products values (1, 'red shoe', 'shoe'), (2, 'blue shoe', 'sale'), (3, 'red hat', 'hat');
//! ").unwrap();
//!
//! let mut search = Product::search_builder();
//! search.split_terms("red shoe", |search, term| {
//!     search.search(Product::query().select(&["id"]).where_op("name", "like", format!("%{term}%")), None);
//! });
//! search.search(Product::query().select(&["id"]).where_eq("tag", "sale"), Some(5));
//! let hits = search.fetch(&conn).unwrap();
//! assert_eq!(hits[0].record.name, "blue shoe");
//! assert_eq!(hits[0].score, 7);
//! ```
//!
//! ## Errors
//! Nothing is validated while composing. A malformed condition, such as one
//! selecting more than the identifier, is reported by SQLite when the query
//! runs, as [`error::SearchError::Persistence`].

pub mod builder;
pub mod condition;
pub mod error;
pub mod model;
pub mod query;
pub mod settings;
pub mod statement;
