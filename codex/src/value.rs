//! Conversions between the YAML values found in frontmatter and the JSON
//! values used in property bags and render contexts.

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use serde_yaml::{Mapping, Number as YamlNumber, Value as YamlValue};

use crate::Error;

/// Convert a YAML value into its JSON equivalent.
///
/// Mapping keys must be strings; YAML permits arbitrary keys, but frontmatter
/// property bags do not.
pub(crate) fn yaml_to_json(value: YamlValue) -> Result<JsonValue, Error> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::Number(JsonNumber::from(i))
            } else if let Some(u) = n.as_u64() {
                JsonValue::Number(JsonNumber::from(u))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                JsonValue::Number(JsonNumber::from_f64(f).ok_or(Error::NonFiniteNumber(f))?)
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(
            seq.into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<JsonValue>, Error>>()?,
        ),
        YamlValue::Mapping(m) => JsonValue::Object(yaml_mapping_to_json_map(m)?),
    })
}

/// Convert a YAML mapping value into a JSON object. `Null` is treated as an
/// empty mapping, which is what an omitted `config` key parses to.
pub(crate) fn yaml_to_json_map(value: YamlValue) -> Result<JsonMap<String, JsonValue>, Error> {
    match value {
        YamlValue::Null => Ok(JsonMap::new()),
        YamlValue::Mapping(m) => yaml_mapping_to_json_map(m),
        _ => Err(Error::ConfigNotAMapping),
    }
}

fn yaml_mapping_to_json_map(m: Mapping) -> Result<JsonMap<String, JsonValue>, Error> {
    let mut map = JsonMap::new();
    for (k, v) in m {
        let k = match k {
            YamlValue::String(s) => s,
            _ => return Err(Error::ObjectKeysMustBeStrings),
        };
        map.insert(k, yaml_to_json(v)?);
    }
    Ok(map)
}

/// Convert a JSON value into its YAML equivalent. This direction cannot fail.
pub(crate) fn json_to_yaml(value: JsonValue) -> YamlValue {
    match value {
        JsonValue::Null => YamlValue::Null,
        JsonValue::Bool(b) => YamlValue::Bool(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                YamlValue::Number(YamlNumber::from(i))
            } else if let Some(u) = n.as_u64() {
                YamlValue::Number(YamlNumber::from(u))
            } else {
                YamlValue::Number(YamlNumber::from(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        JsonValue::String(s) => YamlValue::String(s),
        JsonValue::Array(arr) => YamlValue::Sequence(arr.into_iter().map(json_to_yaml).collect()),
        JsonValue::Object(obj) => YamlValue::Mapping(Mapping::from_iter(
            obj.into_iter().map(|(k, v)| (YamlValue::String(k), json_to_yaml(v))),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_json_round_trip() {
        let yaml: YamlValue = serde_yaml::from_str(
            r#"
            title: Test
            count: 42
            nested:
              tags:
                - a
                - b
            "#,
        )
        .unwrap();
        let json = yaml_to_json(yaml).unwrap();
        assert_eq!(
            json,
            json!({"title": "Test", "count": 42, "nested": {"tags": ["a", "b"]}})
        );
    }

    #[test]
    fn non_string_keys_rejected() {
        let yaml: YamlValue = serde_yaml::from_str("1: one").unwrap();
        match yaml_to_json(yaml) {
            Err(Error::ObjectKeysMustBeStrings) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn null_config_is_empty_map() {
        assert!(yaml_to_json_map(YamlValue::Null).unwrap().is_empty());
    }
}
