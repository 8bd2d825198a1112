//! Declarative un-pivot configuration.
//!
//! A [`DimensionConfig`] names a set of sibling count columns (one per
//! category label) and the output dimension/metric they unfold into. The
//! column names here must agree with what the flattener actually emits; the
//! defaults are derived from the same labels the category maps produce.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Output column receiving the label, e.g. `zone`.
    pub dimension: String,
    /// Source count columns, positionally paired with `labels`.
    pub columns: Vec<String>,
    pub labels: Vec<String>,
    /// Output column receiving the source value, e.g. `attendeeTotal`.
    pub metric: String,
}

impl DimensionConfig {
    fn new(dimension: &str, prefix: &str, labels: &[&str], metric: &str) -> Self {
        Self {
            dimension: dimension.to_string(),
            columns: labels.iter().map(|l| format!("{prefix}{l}")).collect(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            metric: metric.to_string(),
        }
    }

    /// `(source column, label)` pairs in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsFile {
    /// Columns copied verbatim onto every normalized record.
    pub metadata_columns: Vec<String>,
    pub dimensions: Vec<DimensionConfig>,
}

impl DimensionsFile {
    /// Distinct dimension names in first-declared order.
    #[must_use]
    pub fn dimension_names(&self) -> Vec<&str> {
        distinct(self.dimensions.iter().map(|d| d.dimension.as_str()))
    }

    /// Distinct metric names in first-declared order.
    #[must_use]
    pub fn metric_names(&self) -> Vec<&str> {
        distinct(self.dimensions.iter().map(|d| d.metric.as_str()))
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|n| seen.insert(*n)).collect()
}

/// Built-in configuration for the merged webcast/video summary.
#[must_use]
pub fn default_dimension_configs() -> DimensionsFile {
    let metadata_columns = [
        "id",
        "title",
        "vodId",
        "eventUrl",
        "startDate",
        "endDate",
        "total_viewingTime",
        "category",
        "subcategory",
        "v_duration",
        "v_lastViewed",
        "v_whenPublished",
    ]
    .iter()
    .map(|c| (*c).to_string())
    .collect();

    DimensionsFile {
        metadata_columns,
        dimensions: vec![
            DimensionConfig::new(
                "zone",
                "zone_",
                &["APAC", "America", "EMEA", "Other", "Swiss"],
                "attendeeTotal",
            ),
            DimensionConfig::new(
                "webcast_browser",
                "browser_",
                &["Chrome", "Edge", "Other"],
                "attendeeTotal",
            ),
            DimensionConfig::new(
                "webcast_device",
                "deviceType_",
                &["Mobile", "Other", "PC"],
                "attendeeTotal",
            ),
            DimensionConfig::new(
                "video_browser",
                "v_",
                &["Chrome", "Microsoft Edge", "Other Browser"],
                "v_views",
            ),
            DimensionConfig::new(
                "video_device",
                "v_",
                &["Desktop", "Mobile", "Other Device"],
                "v_views",
            ),
        ],
    }
}

/// Load and validate un-pivot configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_dimension_configs(path: &Path) -> Result<DimensionsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: DimensionsFile = serde_yaml::from_str(&content)?;
    validate_dimensions(&file)?;
    Ok(file)
}

/// # Errors
///
/// Returns [`ConfigError::Validation`] when a config is unusable.
pub fn validate_dimensions(file: &DimensionsFile) -> Result<(), ConfigError> {
    if file.dimensions.is_empty() {
        return Err(ConfigError::Validation(
            "at least one dimension config is required".to_string(),
        ));
    }

    for config in &file.dimensions {
        if config.dimension.trim().is_empty() || config.metric.trim().is_empty() {
            return Err(ConfigError::Validation(
                "dimension and metric names must not be empty".to_string(),
            ));
        }
        if config.columns.len() != config.labels.len() {
            return Err(ConfigError::Validation(format!(
                "dimension '{}' has {} columns but {} labels",
                config.dimension,
                config.columns.len(),
                config.labels.len()
            )));
        }
        if config.columns.is_empty() {
            return Err(ConfigError::Validation(format!(
                "dimension '{}' has no source columns",
                config.dimension
            )));
        }
    }

    let outputs: HashSet<&str> = file
        .dimension_names()
        .into_iter()
        .chain(file.metric_names())
        .collect();
    if let Some(clash) = file
        .metadata_columns
        .iter()
        .find(|c| outputs.contains(c.as_str()))
    {
        return Err(ConfigError::Validation(format!(
            "metadata column '{clash}' collides with a dimension or metric name"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "dimensions_test.rs"]
mod tests;
