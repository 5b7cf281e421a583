//! Naming knobs for the generated search SQL.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `SEARCH_BUILDER_` (for example
//! `SEARCH_BUILDER_CTE_NAME=scores`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Result, SearchError};

pub const DEFAULT_CTE_NAME: &str = "id_and_total_score";
pub const DEFAULT_UNION_ALIAS: &str = "ids_and_scores";
pub const DEFAULT_SCORE_ALIAS: &str = "total_score";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Name of the common table expression holding `(id, score)` aggregates.
    pub cte_name: String,
    /// Alias of the unioned `(id, score)` sub-select inside the CTE.
    pub union_alias: String,
    /// Column under which the summed score is projected onto the final rows.
    pub score_alias: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cte_name: DEFAULT_CTE_NAME.to_string(),
            union_alias: DEFAULT_UNION_ALIAS.to_string(),
            score_alias: DEFAULT_SCORE_ALIAS.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, overridden by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::layered(path, true)
    }

    fn layered(path: Option<&Path>, environment: bool) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("cte_name", DEFAULT_CTE_NAME)?
            .set_default("union_alias", DEFAULT_UNION_ALIAS)?
            .set_default("score_alias", DEFAULT_SCORE_ALIAS)?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        if environment {
            builder = builder.add_source(Environment::with_prefix("SEARCH_BUILDER"));
        }
        let settings = builder.build()?.try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Every name is written into the SQL as a single quoted identifier, so it
    /// may not be empty, qualified, aliased or carry a quote.
    pub fn validate(&self) -> Result<()> {
        for (key, name) in [
            ("cte_name", &self.cte_name),
            ("union_alias", &self.union_alias),
            ("score_alias", &self.score_alias),
        ] {
            let lowered = name.to_ascii_lowercase();
            if name.trim().is_empty() || name.contains(['.', '"']) || lowered.contains(" as ") {
                return Err(SearchError::Config(format!("{key} must be a plain identifier, got {name:?}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_environment() {
        let settings = Settings::layered(None, false).expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn qualified_or_aliased_names_are_rejected() {
        for name in ["scores.total", "scores as s", "", "sc\"ore"] {
            let settings = Settings { cte_name: name.to_string(), ..Settings::default() };
            let err = settings.validate().unwrap_err();
            assert!(matches!(err, SearchError::Config(_)), "{name:?}");
        }
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Settings::load(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(format!("{err}").starts_with("Config error"));
    }
}
