//! Catalog product rules.

use serde_json::Value;

use super::category::{ParentKey, SizeChart};

pub const MIN_IMAGES: usize = 2;
pub const MAX_IMAGES: usize = 5;
pub const MIN_FEATURES: usize = 2;
pub const MAX_FEATURES: usize = 5;

/// At most 3 non-empty features, preserving slot order.
pub fn display_features(features: &[String]) -> Vec<String> {
    features
        .iter()
        .filter(|f| !f.trim().is_empty())
        .take(3)
        .cloned()
        .collect()
}

pub fn is_combo(parent: Option<ParentKey>) -> bool {
    parent == Some(ParentKey::Combos)
}

pub fn is_outfit(parent: Option<ParentKey>) -> bool {
    parent == Some(ParentKey::Outfit)
}

pub fn is_shoes(parent: Option<ParentKey>) -> bool {
    parent == Some(ParentKey::Shoes)
}

/// Write-time validation of image and feature slots. Not a DB
/// constraint; enforced before persistence.
pub fn validate_media(images: &[String], features: &[String]) -> Result<(), String> {
    let image_count = images.iter().filter(|i| !i.trim().is_empty()).count();
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&image_count) {
        return Err(format!(
            "products need between {MIN_IMAGES} and {MAX_IMAGES} images"
        ));
    }
    let feature_count = features.iter().filter(|f| !f.trim().is_empty()).count();
    if !(MIN_FEATURES..=MAX_FEATURES).contains(&feature_count) {
        return Err(format!(
            "products need between {MIN_FEATURES} and {MAX_FEATURES} features"
        ));
    }
    Ok(())
}

/// A combo product may carry default size selections
/// (`default_upper` / `default_lower` / `default_shoe`); each one given
/// must name a size its child category actually offers.
pub fn validate_combo_defaults(defaults: &Value, chart: &SizeChart<'_>) -> Result<(), String> {
    let Some(obj) = defaults.as_object() else {
        return Err("combo size defaults must be a JSON object".to_string());
    };

    for (key, chart_key) in [
        ("default_upper", "upper_sizes"),
        ("default_lower", "lower_sizes"),
        ("default_shoe", "shoe_sizes"),
    ] {
        if let Some(value) = obj.get(key) {
            let Some(size) = value.as_str() else {
                return Err(format!("{key} must be a string"));
            };
            if !chart.offers(chart_key, size) {
                return Err(format!(
                    "{key} \"{size}\" is not offered by this category"
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn display_features_caps_at_three_in_slot_order() {
        let features = strings(&["Breathable", "", "Slim fit", "Machine wash", "Imported"]);
        assert_eq!(
            display_features(&features),
            strings(&["Breathable", "Slim fit", "Machine wash"])
        );
    }

    #[test]
    fn display_features_skips_blank_slots() {
        let features = strings(&["", "  ", "Leather sole"]);
        assert_eq!(display_features(&features), strings(&["Leather sole"]));
    }

    #[test]
    fn media_validation_bounds() {
        let two = strings(&["a.jpg", "b.jpg"]);
        assert!(validate_media(&two, &two).is_ok());

        let one = strings(&["a.jpg"]);
        assert!(validate_media(&one, &two).is_err());
        assert!(validate_media(&two, &one).is_err());

        let six = strings(&["a", "b", "c", "d", "e", "f"]);
        assert!(validate_media(&six, &two).is_err());
    }

    #[test]
    fn parent_kind_helpers() {
        assert!(is_combo(Some(ParentKey::Combos)));
        assert!(!is_combo(Some(ParentKey::Outfit)));
        assert!(is_outfit(Some(ParentKey::Outfit)));
        assert!(is_shoes(Some(ParentKey::Shoes)));
        assert!(!is_shoes(None));
    }

    #[test]
    fn combo_defaults_must_exist_in_chart() {
        let config = json!({"upper_sizes": ["S", "M"], "lower_sizes": ["30"]});
        let chart = SizeChart::new(ParentKey::Combos, &config);

        assert!(validate_combo_defaults(&json!({"default_upper": "S"}), &chart).is_ok());
        assert!(validate_combo_defaults(&json!({"default_upper": "XL"}), &chart).is_err());
        // No shoe sizes configured, so no shoe default is accepted.
        assert!(validate_combo_defaults(&json!({"default_shoe": "42"}), &chart).is_err());
        assert!(validate_combo_defaults(&json!({}), &chart).is_ok());
    }
}
