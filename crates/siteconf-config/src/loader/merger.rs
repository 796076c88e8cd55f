//! Deep merge for ordered configuration fragments.

use crate::ConfigFragment;
use serde_json::{Map, Value};

/// Merge fragments in order; later fragments win key-by-key.
///
/// Tables merge recursively. Sequences and scalars are replaced whole, so a
/// later module list never concatenates onto an earlier one.
pub fn merge(fragments: Vec<ConfigFragment>) -> ConfigFragment {
    let mut merged = Map::new();
    for fragment in fragments {
        merge_maps(&mut merged, fragment.into_map());
    }
    ConfigFragment::from_map(merged)
}

fn merge_maps(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

pub(super) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            merge_maps(base_map, overlay_map);
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value;
        }
    }
}
