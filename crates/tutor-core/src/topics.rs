//! Two-level course taxonomy: unit -> section -> {title, keywords}.
//!
//! Loaded once from JSON and never mutated. Units and sections keep the order
//! they have in the file, so listings match the course outline as written.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSection {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TopicSection {
    /// Keywords lowercased for case-insensitive substring matching.
    pub fn lowercase_keywords(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.to_lowercase()).collect()
    }
}

/// Sections of one unit, in file order.
pub type TopicUnit = Vec<(String, TopicSection)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicCatalog {
    units: Vec<(String, TopicUnit)>,
}

impl TopicCatalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::parse(json).map_err(|e| Error::InvalidConfig(format!("topic catalog: {e}")))
    }

    // serde_json is built with `preserve_order`, so `Map` iterates in file order.
    fn parse(json: &str) -> serde_json::Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        let mut units = Vec::with_capacity(raw.len());
        for (unit, sections) in raw {
            let sections: Map<String, Value> = serde_json::from_value(sections)?;
            let sections = sections
                .into_iter()
                .map(|(name, section)| -> serde_json::Result<(String, TopicSection)> {
                    Ok((name, serde_json::from_value(section)?))
                })
                .collect::<serde_json::Result<TopicUnit>>()?;
            units.push((unit, sections));
        }
        Ok(Self { units })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::NotFound(format!("topic catalog {}: {e}", path.display())))?;
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), units = catalog.units.len(), "loaded topic catalog");
        if catalog.units.is_empty() {
            tracing::warn!(path = %path.display(), "topic catalog has no units; quizzes will find no content");
        }
        Ok(catalog)
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &TopicUnit)> {
        self.units.iter().map(|(name, unit)| (name.as_str(), unit))
    }
}
