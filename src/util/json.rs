// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use serde_json::{Map, Value};

/// Merge all entries of a json object into another, overwriting existing keys.
///
/// Used to fold a partial push payload into the cached device state.
pub fn merge_entries(source: Map<String, Value>, dest: &mut Map<String, Value>) {
    for (key, value) in source {
        dest.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use crate::util::json::merge_entries;
    use serde_json::{Map, json};

    #[test]
    fn merge_overwrites_existing_keys_and_keeps_others() {
        let mut dest = Map::new();
        dest.insert("openlevel".into(), json!(75));
        dest.insert("movement".into(), json!("stop"));
        dest.insert("connected".into(), json!(true));

        let mut source = Map::new();
        source.insert("openlevel".into(), json!(79));

        merge_entries(source, &mut dest);
        assert_eq!(Some(&json!(79)), dest.get("openlevel"));
        assert_eq!(Some(&json!("stop")), dest.get("movement"));
        assert_eq!(Some(&json!(true)), dest.get("connected"));
    }

    #[test]
    fn merge_of_empty_source_changes_nothing() {
        let mut dest = Map::new();
        dest.insert("movement".into(), json!("up"));
        merge_entries(Map::new(), &mut dest);
        assert_eq!(1, dest.len());
    }
}
