//! Configuration types for the Strata engine.
//!
//! All types implement [`serde::Deserialize`] and every field has a default,
//! so a partial (or empty) configuration document is valid.
//!
//! # Example
//!
//! ```
//! # use strata::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().algorithm(), "layered");
//! assert!(config.layout().options().animate);
//! ```

use serde::Deserialize;

use crate::layout::{
    EngineBuilder, LayoutOptions,
    engines::{ForceConfig, GridConfig, LayeredConfig},
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Layout configuration: the default algorithm, run flags and per-engine tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    algorithm: String,
    animate: bool,
    fit: bool,
    respect_hierarchy: bool,
    force: ForceConfig,
    layered: LayeredConfig,
    grid: GridConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            algorithm: "layered".to_string(),
            animate: options.animate,
            fit: options.fit,
            respect_hierarchy: options.respect_hierarchy,
            force: ForceConfig::default(),
            layered: LayeredConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Name of the algorithm a new session starts with.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn with_respect_hierarchy(mut self, respect_hierarchy: bool) -> Self {
        self.respect_hierarchy = respect_hierarchy;
        self
    }

    /// Run flags applied to every layout.
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            animate: self.animate,
            fit: self.fit,
            respect_hierarchy: self.respect_hierarchy,
        }
    }

    pub fn force(&self) -> &ForceConfig {
        &self.force
    }

    pub fn layered(&self) -> &LayeredConfig {
        &self.layered
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// An [`EngineBuilder`] carrying this configuration's engine tuning.
    pub fn engine_builder(&self) -> EngineBuilder {
        EngineBuilder::new()
            .with_force(self.force)
            .with_layered(self.layered)
            .with_grid(self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"layout": {"algorithm": "force", "respect_hierarchy": true, "grid": {"spacing": 40.0}}}"#,
        )
        .unwrap();

        let layout = config.layout();
        assert_eq!(layout.algorithm(), "force");
        assert!(layout.options().respect_hierarchy);
        assert!(layout.options().fit);
        assert_eq!(layout.grid().spacing(), 40.0);
        assert_eq!(layout.force().iterations(), ForceConfig::default().iterations());
    }

    #[test]
    fn test_empty_document() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.layout().algorithm(), "layered");
        assert_eq!(config.layout().options(), LayoutOptions::default());
    }
}
