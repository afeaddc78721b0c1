//! Deep merge for layered YAML configuration.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences are replaced entirely (a local `weekdays` list wins outright)
//! - Null values in overlay delete the corresponding key from base
//! - Scalars in overlay replace scalars in base

use serde_yaml::Value;

/// Deep merge two YAML values; `overlay` wins at every conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        // An empty file parses to null and changes nothing
        (base, Value::Null) => base.clone(),

        (_, overlay) => overlay.clone(),
    }
}

/// Merge configs in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_scalar_replaces_base() {
        let base = yaml("settings:\n  max_attempts: 1\n  parallel: true\n");
        let overlay = yaml("settings:\n  max_attempts: 3\n");

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["settings"]["max_attempts"], 3);
        assert_eq!(result["settings"]["parallel"], true);
    }

    #[test]
    fn sequences_are_replaced_not_merged() {
        let base = yaml("business_hours:\n  weekdays: [Mon, Tue, Wed]\n");
        let overlay = yaml("business_hours:\n  weekdays: [Sat]\n");

        let result = deep_merge(&base, &overlay);
        let days = result["business_hours"]["weekdays"].as_sequence().unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0], "Sat");
    }

    #[test]
    fn null_removes_inherited_value() {
        let base = yaml("settings:\n  step_timeout_secs: 30\n  max_parallel: 2\n");
        let overlay = yaml("settings:\n  step_timeout_secs: null\n");

        let result = deep_merge(&base, &overlay);

        assert!(result["settings"].get("step_timeout_secs").is_none());
        assert_eq!(result["settings"]["max_parallel"], 2);
    }

    #[test]
    fn empty_overlay_file_changes_nothing() {
        let base = yaml("settings:\n  parallel: false\n");
        let overlay = yaml("~");

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["settings"]["parallel"], false);
    }

    #[test]
    fn merge_configs_merges_multiple_in_order() {
        let configs = vec![yaml("a: 1\nb: 2"), yaml("b: 3\nc: 4"), yaml("c: 5")];

        let result = merge_configs(&configs);

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 3);
        assert_eq!(result["c"], 5);
    }

    #[test]
    fn merge_configs_of_nothing_is_empty_mapping() {
        let result = merge_configs(&[]);
        assert!(result.as_mapping().unwrap().is_empty());
    }
}
