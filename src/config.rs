use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAlias {
    pub real_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Filtering and alias rules, in the format the config store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub include_merge_commits: bool,
    pub include_file_filters: Vec<String>,
    pub exclude_file_filters: Vec<String>,
    pub author_aliases: Vec<AuthorAlias>,
    pub exclude_authors: Vec<String>,
    pub exclude_commits: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_merge_commits: false,
            include_file_filters: vec![".*".to_string()],
            exclude_file_filters: Vec::new(),
            author_aliases: Vec::new(),
            exclude_authors: Vec::new(),
            exclude_commits: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn with_alias(mut self, real_name: &str, aliases: &[&str]) -> Self {
        self.author_aliases.push(AuthorAlias {
            real_name: real_name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }
}

/// Tuning knobs for [`crate::pipeline::Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Entries kept per stage cache.
    pub cache_capacity: usize,
    pub max_data_points: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cache_capacity: 16,
            max_data_points: crate::reduce::MAX_DATA_POINTS,
        }
    }
}

/// Reads a [`FilterConfig`] from a JSON file, or returns the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FilterConfig> {
    let Some(path) = path else {
        return Ok(FilterConfig::default());
    };
    let reader = BufReader::new(File::open(path)?);
    let config: FilterConfig = serde_json::from_reader(reader)?;
    debug!(
        path = %path.display(),
        aliases = config.author_aliases.len(),
        excluded_authors = config.exclude_authors.len(),
        "loaded filter config"
    );
    Ok(config)
}
