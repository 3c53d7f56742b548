//! Application configuration.
//!
//! Precedence: CLI flags > environment > config files > defaults. Each layer is an [`AppConfig`]
//! with every field optional; a higher layer is filled from the next lower one with
//! [`AppConfig::fill_from`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::QueryError;
use crate::query::PagingPolicy;

pub const DEFAULT_DATA_PATH: &str = "data/sales.csv";
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Which evaluator answers queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Scan an in-memory snapshot.
    #[default]
    Memory,
    /// Push filters, ordering and paging down to SQLite.
    Sqlite,
}

impl BackendKind {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub database_url: Option<String>,
    pub default_page_size: Option<usize>,
    pub max_page_size: Option<usize>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    /// A log4rs YAML file; used instead of `log_dir`/`log_level` when set.
    pub log_config: Option<PathBuf>,
}

impl AppConfig {
    /// Fill every unset field from `lower`.
    pub fn fill_from(&mut self, lower: Self) {
        macro_rules! fill {
            ($($f:ident),*) => { $( if self.$f.is_none() { self.$f = lower.$f; } )* };
        }
        fill!(
            data_path,
            backend,
            database_url,
            default_page_size,
            max_page_size,
            log_dir,
            log_level,
            log_config
        );
    }

    pub fn from_toml_str(s: &str) -> Result<Self, QueryError> {
        toml::from_str(s).map_err(|e| QueryError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, QueryError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&s)
            .map_err(|e| QueryError::Config(format!("{}: {e}", path.display())))
    }

    /// The environment layer, read through `lookup` so tests need not touch the process env.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = lookup("SALESQ_BACKEND").and_then(|s| {
            let kind = BackendKind::parse(&s);
            if kind.is_none() {
                log::warn!("ignoring unknown SALESQ_BACKEND {s:?}");
            }
            kind
        });
        Self {
            data_path: lookup("SALESQ_DATA").map(PathBuf::from),
            backend,
            database_url: lookup("SALESQ_DATABASE_URL"),
            default_page_size: lookup("SALESQ_PAGE_SIZE").and_then(|s| s.trim().parse().ok()),
            max_page_size: None,
            log_dir: lookup("SALESQ_LOG_DIR").map(PathBuf::from),
            log_level: lookup("SALESQ_LOG_LEVEL"),
            log_config: lookup("SALESQ_LOG_CONFIG").map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Config file locations in precedence order.
    pub fn candidate_paths(
        cli_config: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(p) = cli_config {
            paths.push(p.to_path_buf());
        }
        if let Some(p) = lookup("SALESQ_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Some(home) = lookup("HOME").or_else(|| lookup("USERPROFILE")) {
            paths.push(PathBuf::from(home).join(".config").join("salesq.toml"));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join("salesq.toml"));
        }
        paths
    }

    /// Environment over config files. An explicit `--config` file that is missing is an error;
    /// the other locations are optional.
    pub fn load(cli_config: Option<&Path>) -> Result<Self, QueryError> {
        if let Some(p) = cli_config
            && !p.exists()
        {
            return Err(QueryError::Config(format!("config file {} not found", p.display())));
        }
        let lookup = |k: &str| std::env::var(k).ok();
        let mut cfg = Self::from_vars(lookup);
        for path in Self::candidate_paths(cli_config, lookup) {
            if path.exists() {
                log::debug!("reading config {}", path.display());
                cfg.fill_from(Self::from_file(&path)?);
            }
        }
        Ok(cfg)
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.data_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    /// Page sizes below 1 are ignored; the default never exceeds the cap.
    #[must_use]
    pub fn paging_policy(&self) -> PagingPolicy {
        let base = PagingPolicy::default();
        let max_page_size = self.max_page_size.filter(|n| *n >= 1).unwrap_or(base.max_page_size);
        let default_page_size = self
            .default_page_size
            .filter(|n| *n >= 1)
            .unwrap_or(base.default_page_size)
            .min(max_page_size);
        PagingPolicy { default_page_size, max_page_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn env_layer_reads_known_variables() {
        let cfg = AppConfig::from_vars(vars(&[
            ("SALESQ_DATA", "/tmp/s.csv"),
            ("SALESQ_BACKEND", "SQLite"),
            ("SALESQ_PAGE_SIZE", "25"),
        ]));
        assert_eq!(cfg.data_path, Some(PathBuf::from("/tmp/s.csv")));
        assert_eq!(cfg.backend(), BackendKind::Sqlite);
        assert_eq!(cfg.paging_policy().default_page_size, 25);
        assert_eq!(cfg.database_url(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn higher_layer_wins() {
        let mut env = AppConfig::from_vars(vars(&[("SALESQ_BACKEND", "memory")]));
        let file = AppConfig::from_toml_str(
            "backend = \"sqlite\"\ndatabase_url = \"sqlite://sales.db\"\nmax_page_size = 50\n",
        )
        .unwrap();
        env.fill_from(file);
        assert_eq!(env.backend(), BackendKind::Memory);
        assert_eq!(env.database_url(), "sqlite://sales.db");
        assert_eq!(env.paging_policy().max_page_size, 50);
    }

    #[test]
    fn unknown_keys_and_bad_values() {
        assert!(AppConfig::from_toml_str("backend = \"postgres\"").is_err());
        let cfg = AppConfig::from_vars(vars(&[("SALESQ_BACKEND", "oracle")]));
        assert_eq!(cfg.backend, None);
    }

    #[test]
    fn default_page_size_is_capped() {
        let cfg = AppConfig {
            default_page_size: Some(500),
            max_page_size: Some(100),
            ..AppConfig::default()
        };
        let p = cfg.paging_policy();
        assert_eq!((p.default_page_size, p.max_page_size), (100, 100));
        assert_eq!(AppConfig::default().paging_policy(), PagingPolicy::default());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/salesq.toml"))).unwrap_err();
        assert!(matches!(err, QueryError::Config(_)));
    }

    #[test]
    fn candidate_order() {
        let paths = AppConfig::candidate_paths(
            Some(Path::new("cli.toml")),
            vars(&[("SALESQ_CONFIG", "env.toml"), ("HOME", "/home/u")]),
        );
        assert_eq!(paths[0], PathBuf::from("cli.toml"));
        assert_eq!(paths[1], PathBuf::from("env.toml"));
        assert_eq!(paths[2], PathBuf::from("/home/u/.config/salesq.toml"));
    }
}
