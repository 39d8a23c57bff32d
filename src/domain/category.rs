//! Category hierarchy: fixed parents and per-child size configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The fixed set of top-level product groupings. Rows are seeded by
/// migration and never created or deleted through the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKey {
    Outfit,
    Shoes,
    Combos,
}

impl ParentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outfit => "outfit",
            Self::Shoes => "shoes",
            Self::Combos => "combos",
        }
    }

    pub fn from_str(key: &str) -> Option<Self> {
        match key {
            "outfit" => Some(Self::Outfit),
            "shoes" => Some(Self::Shoes),
            "combos" => Some(Self::Combos),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SizeConfigError {
    #[error("size configuration must be a JSON object")]
    NotAnObject,
    #[error("size configuration for {0} categories must have a \"sizes\" key")]
    MissingSizes(&'static str),
    #[error("size configuration for combo categories must have \"upper_sizes\" and \"lower_sizes\"")]
    MissingComboSizes,
    #[error("\"{0}\" must be a list of non-empty strings")]
    BadSizeList(String),
}

/// Validated size configuration, selected by the parent category's key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SizeConfig {
    Sizes {
        sizes: Vec<String>,
    },
    Combo {
        upper_sizes: Vec<String>,
        lower_sizes: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        shoe_sizes: Option<Vec<String>>,
    },
}

impl SizeConfig {
    /// Write-time validation of a raw configuration document. Outfit and
    /// Shoes children require `sizes`; Combos children require both
    /// `upper_sizes` and `lower_sizes`, with `shoe_sizes` optional.
    pub fn parse(parent: ParentKey, doc: &Value) -> Result<Self, SizeConfigError> {
        let obj = doc.as_object().ok_or(SizeConfigError::NotAnObject)?;
        match parent {
            ParentKey::Outfit | ParentKey::Shoes => {
                let sizes = obj
                    .get("sizes")
                    .ok_or(SizeConfigError::MissingSizes(parent.as_str()))?;
                Ok(Self::Sizes {
                    sizes: size_list("sizes", sizes)?,
                })
            }
            ParentKey::Combos => {
                let upper = obj
                    .get("upper_sizes")
                    .ok_or(SizeConfigError::MissingComboSizes)?;
                let lower = obj
                    .get("lower_sizes")
                    .ok_or(SizeConfigError::MissingComboSizes)?;
                let shoe = obj
                    .get("shoe_sizes")
                    .map(|v| size_list("shoe_sizes", v))
                    .transpose()?;
                Ok(Self::Combo {
                    upper_sizes: size_list("upper_sizes", upper)?,
                    lower_sizes: size_list("lower_sizes", lower)?,
                    shoe_sizes: shoe,
                })
            }
        }
    }

    /// Document form for persistence.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

fn size_list(key: &str, value: &Value) -> Result<Vec<String>, SizeConfigError> {
    let entries = value
        .as_array()
        .ok_or_else(|| SizeConfigError::BadSizeList(key.to_string()))?;
    let mut sizes = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.as_str() {
            Some(s) if !s.trim().is_empty() => sizes.push(s.to_string()),
            _ => return Err(SizeConfigError::BadSizeList(key.to_string())),
        }
    }
    Ok(sizes)
}

/// Read-side view over a stored configuration document. Stored documents
/// are schemaless (legacy rows may predate validation), so every accessor
/// returns empty when the expected key is absent or when the parent key
/// does not match the accessor's applicability.
#[derive(Clone, Copy, Debug)]
pub struct SizeChart<'a> {
    parent: ParentKey,
    doc: &'a Value,
}

impl<'a> SizeChart<'a> {
    pub fn new(parent: ParentKey, doc: &'a Value) -> Self {
        Self { parent, doc }
    }

    /// Sizes for Outfit and Shoes children; empty for Combos.
    pub fn sizes(&self) -> Vec<String> {
        match self.parent {
            ParentKey::Outfit | ParentKey::Shoes => self.list("sizes"),
            ParentKey::Combos => Vec::new(),
        }
    }

    /// Upper-body sizes for Combos children; empty otherwise.
    pub fn upper_sizes(&self) -> Vec<String> {
        match self.parent {
            ParentKey::Combos => self.list("upper_sizes"),
            _ => Vec::new(),
        }
    }

    /// Lower-body sizes for Combos children; empty otherwise.
    pub fn lower_sizes(&self) -> Vec<String> {
        match self.parent {
            ParentKey::Combos => self.list("lower_sizes"),
            _ => Vec::new(),
        }
    }

    /// Shoe sizes for Combos children; empty otherwise. Optional even
    /// for Combos.
    pub fn shoe_sizes(&self) -> Vec<String> {
        match self.parent {
            ParentKey::Combos => self.list("shoe_sizes"),
            _ => Vec::new(),
        }
    }

    pub fn has_shoe_sizes(&self) -> bool {
        !self.shoe_sizes().is_empty()
    }

    /// Does the chart offer this size anywhere?
    pub fn offers(&self, key: &str, size: &str) -> bool {
        self.list(key).iter().any(|s| s == size)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.doc
            .get(key)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// URL slug from a display name.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_requires_sizes_for_outfit_and_shoes() {
        let doc = json!({"sizes": ["S", "M", "L"]});
        assert!(SizeConfig::parse(ParentKey::Outfit, &doc).is_ok());
        assert!(SizeConfig::parse(ParentKey::Shoes, &doc).is_ok());

        let missing = json!({"upper_sizes": ["S"]});
        assert_eq!(
            SizeConfig::parse(ParentKey::Outfit, &missing),
            Err(SizeConfigError::MissingSizes("outfit"))
        );
    }

    #[test]
    fn parse_requires_upper_and_lower_for_combos() {
        let doc = json!({"upper_sizes": ["S", "M"], "lower_sizes": ["30", "32"]});
        let config = SizeConfig::parse(ParentKey::Combos, &doc).unwrap();
        assert!(matches!(config, SizeConfig::Combo { shoe_sizes: None, .. }));

        let missing = json!({"upper_sizes": ["S", "M"]});
        assert_eq!(
            SizeConfig::parse(ParentKey::Combos, &missing),
            Err(SizeConfigError::MissingComboSizes)
        );
    }

    #[test]
    fn parse_rejects_malformed_documents() {
        assert_eq!(
            SizeConfig::parse(ParentKey::Outfit, &json!("not an object")),
            Err(SizeConfigError::NotAnObject)
        );
        assert_eq!(
            SizeConfig::parse(ParentKey::Outfit, &json!({"sizes": [""]})),
            Err(SizeConfigError::BadSizeList("sizes".to_string()))
        );
        assert_eq!(
            SizeConfig::parse(ParentKey::Combos, &json!({"upper_sizes": "S", "lower_sizes": []})),
            Err(SizeConfigError::BadSizeList("upper_sizes".to_string()))
        );
    }

    #[test]
    fn chart_gates_accessors_by_parent_kind() {
        let doc = json!({"sizes": ["S", "M"], "upper_sizes": ["L"]});

        let outfit = SizeChart::new(ParentKey::Outfit, &doc);
        assert_eq!(outfit.sizes(), vec!["S", "M"]);
        assert!(outfit.upper_sizes().is_empty());
        assert!(outfit.lower_sizes().is_empty());
        assert!(outfit.shoe_sizes().is_empty());

        // A Combos child never exposes the flat size list.
        let combos = SizeChart::new(ParentKey::Combos, &doc);
        assert!(combos.sizes().is_empty());
        assert_eq!(combos.upper_sizes(), vec!["L"]);
    }

    #[test]
    fn combo_without_shoe_sizes_has_none() {
        let doc = json!({"upper_sizes": ["S", "M"], "lower_sizes": ["30", "32"]});
        let chart = SizeChart::new(ParentKey::Combos, &doc);
        assert!(!chart.has_shoe_sizes());
        assert!(chart.shoe_sizes().is_empty());
        assert_eq!(chart.upper_sizes(), vec!["S", "M"]);
        assert_eq!(chart.lower_sizes(), vec!["30", "32"]);
    }

    #[test]
    fn chart_tolerates_legacy_documents() {
        let chart_doc = json!({"sizes": "oops"});
        let chart = SizeChart::new(ParentKey::Outfit, &chart_doc);
        assert!(chart.sizes().is_empty());

        let empty = json!({});
        assert!(SizeChart::new(ParentKey::Shoes, &empty).sizes().is_empty());
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Formal Shirts"), "formal-shirts");
        assert_eq!(slugify("  Shoes  "), "shoes");
    }
}
