//! Parameter shaping shared by the query string and the request payload.

use serde_json::{Map, Value};

/// Ordered string-keyed parameter mapping. `Value::Null` marks an absent
/// entry.
pub type Params = Map<String, Value>;

/// Return a shaped copy of `params`.
///
/// Null entries are dropped, booleans become `"1"`/`"0"`, and nested
/// mappings are shaped recursively. Lists and other scalars are copied as
/// they are. Shaping an already shaped mapping returns an equal mapping.
pub fn shape(params: &Params) -> Params {
    params
        .iter()
        .filter_map(|(key, value)| {
            let shaped = match value {
                Value::Null => return None,
                Value::Bool(flag) => Value::String(if *flag { "1" } else { "0" }.to_string()),
                Value::Object(nested) => Value::Object(shape(nested)),
                other => other.clone(),
            };
            Some((key.clone(), shaped))
        })
        .collect()
}
