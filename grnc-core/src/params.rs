//! # Command Parameters
//!
//! Groonga accepts every option of a command as a flat `key=value` pair, even for
//! commands whose options are logically nested. Nesting is expressed through the key
//! itself: a labeled sub-object `{drilldowns: {label: {keys: "tag"}}}` travels on the
//! wire as `drilldowns[label].keys=tag`.
//!
//! This module provides both representations and the conversion between them:
//!
//! * [`ParamMap`] — the nested, caller-facing option tree.
//! * [`FlatParams`] — the flat, wire-facing key/value mapping.
//! * [`flatten`] / [`flatten_into`] — the encoder from one to the other.
//!
//! Both maps preserve insertion order, which is the order parameters are sent in.
use time::OffsetDateTime;

/// A single option value.
///
/// `Map` nodes are either further nested options or label maps, depending on the key
/// they sit under; see [`flatten_into`]. `Time` values only ever reach the wire inside
/// a `values` payload, where they are serialized as fractional Unix epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(OffsetDateTime),
    List(Vec<ParamValue>),
    Map(ParamMap),
}

impl ParamValue {
    /// Returns `true` for values that serialize to a single wire token.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ParamValue::List(_) | ParamValue::Map(_))
    }

    /// Converts the value into JSON.
    ///
    /// `Time` becomes a fractional Unix epoch timestamp in seconds, not the engine's
    /// native time representation. A non-finite `Float` maps to JSON `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Str(s) => serde_json::Value::String(s.clone()),
            ParamValue::Int(i) => serde_json::Value::Number((*i).into()),
            ParamValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ParamValue::Bool(b) => serde_json::Value::Bool(*b),
            ParamValue::Time(t) => {
                let seconds = t.unix_timestamp_nanos() as f64 / 1_000_000_000.0;
                serde_json::Number::from_f64(seconds)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            ParamValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ParamValue::to_json).collect())
            }
            ParamValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Builds a value from JSON. Numbers become `Int` when they are integral.
    pub fn from_json(value: &serde_json::Value) -> ParamValue {
        match value {
            serde_json::Value::Null => ParamValue::Str(String::new()),
            serde_json::Value::Bool(b) => ParamValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => ParamValue::Str(s.clone()),
            serde_json::Value::Array(items) => {
                ParamValue::List(items.iter().map(ParamValue::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut out = ParamMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), ParamValue::from_json(v));
                }
                ParamValue::Map(out)
            }
        }
    }

    /// Renders the value as a single wire token. Collections go through JSON.
    pub fn to_wire_string(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            other => other.to_json().to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<OffsetDateTime> for ParamValue {
    fn from(value: OffsetDateTime) -> Self {
        ParamValue::Time(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        ParamValue::List(value)
    }
}

impl From<ParamMap> for ParamValue {
    fn from(value: ParamMap) -> Self {
        ParamValue::Map(value)
    }
}

/// An ordered string-keyed map of [`ParamValue`].
///
/// Backed by a vector of pairs: iteration order is insertion order, and inserting an
/// existing key replaces its value in place without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<(String, ParamValue)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParamValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The flat wire-level parameter mapping produced by [`flatten`].
///
/// Keys appear in first-seen traversal order of the source tree. Values are scalars;
/// collections have already been serialized by the flattener.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatParams {
    entries: Vec<(String, ParamValue)>,
}

impl FlatParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, replacing an existing value in place. Replacement only happens
    /// when the source tree carried duplicate structural labels, which is caller error.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Flattens `input` into a fresh [`FlatParams`].
pub fn flatten(input: &ParamMap) -> FlatParams {
    let mut out = FlatParams::new();
    flatten_into(&mut out, input, "");
    out
}

/// Flattens `input` into `out` under `prefix`.
///
/// For each key `K` with value `V`:
///
/// * scalar `V` — the key is renamed through [`fix_scalar_key`] and written as
///   `prefix + key`;
/// * `V` is a collection and `K` is exactly `values` — no recursion; the whole
///   collection is serialized to one JSON string (strings pass through unchanged,
///   `Time` leaves become fractional epoch seconds) under `prefix + "values"`;
/// * `V` is a map under any other key — a label map: each entry recurses with
///   prefix `prefix + K + "[" + label + "]."`.
///
/// Empty label maps emit nothing. A label map entry whose value is not itself a map
/// is a caller contract violation and emits nothing. Calling this twice with the same
/// `out` accumulates, which callers use to merge onto a pre-seeded mapping.
pub fn flatten_into(out: &mut FlatParams, input: &ParamMap, prefix: &str) {
    for (key, value) in input.iter() {
        match value {
            ParamValue::Map(_) | ParamValue::List(_) if key == "values" => {
                out.insert(format!("{prefix}values"), serialize_values(value));
            }
            ParamValue::Map(labels) => {
                for (label, sub) in labels.iter() {
                    if let ParamValue::Map(sub) = sub {
                        flatten_into(out, sub, &format!("{prefix}{key}[{label}]."));
                    }
                }
            }
            ParamValue::List(_) => {}
            scalar => {
                out.insert(format!("{prefix}{}", fix_scalar_key(key)), scalar.clone());
            }
        }
    }
}

/// The scalar key rename table.
///
/// The engine spells the window parameters of a dynamic column with a dot
/// (`columns[x].window.sort_keys`), while callers address them with an underscore.
pub fn fix_scalar_key(key: &str) -> &str {
    match key {
        "window_sort_keys" => "window.sort_keys",
        "window_group_keys" => "window.group_keys",
        _ => key,
    }
}

/// Serializes a `values` payload to its single wire string.
fn serialize_values(value: &ParamValue) -> ParamValue {
    match value {
        ParamValue::Str(s) => ParamValue::Str(s.clone()),
        other => ParamValue::Str(other.to_json().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_map<const N: usize>(entries: [(&str, ParamMap); N]) -> ParamValue {
        ParamValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, ParamValue::Map(v)))
                .collect(),
        )
    }

    #[test]
    fn scalars_pass_through_in_insertion_order() {
        let mut input = ParamMap::new();
        input.insert("table", "Users");
        input.insert("limit", 10i64);
        input.insert("offset", 0i64);

        let flat = flatten(&input);
        let keys: Vec<_> = flat.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["table", "limit", "offset"]);
        assert_eq!(flat.get("table"), Some(&ParamValue::Str("Users".into())));
        assert_eq!(flat.get("limit"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn window_keys_are_renamed() {
        let mut x = ParamMap::new();
        x.insert("window_sort_keys", "a");
        x.insert("window_group_keys", "b");
        let mut input = ParamMap::new();
        input.insert("columns", label_map([("x", x)]));

        let flat = flatten(&input);
        assert_eq!(
            flat.get("columns[x].window.sort_keys"),
            Some(&ParamValue::Str("a".into()))
        );
        assert_eq!(
            flat.get("columns[x].window.group_keys"),
            Some(&ParamValue::Str("b".into()))
        );
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn label_maps_fan_out_without_cross_contamination() {
        let mut label1 = ParamMap::new();
        label1.insert("keys", "k1");
        let mut label2 = ParamMap::new();
        label2.insert("keys", "k2");
        let mut input = ParamMap::new();
        input.insert("drilldowns", label_map([("label1", label1), ("label2", label2)]));

        let flat = flatten(&input);
        assert_eq!(
            flat.get("drilldowns[label1].keys"),
            Some(&ParamValue::Str("k1".into()))
        );
        assert_eq!(
            flat.get("drilldowns[label2].keys"),
            Some(&ParamValue::Str("k2".into()))
        );
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn values_are_serialized_atomically_at_any_depth() {
        let mut row = ParamMap::new();
        row.insert("_key", "alice");
        let values = ParamValue::List(vec![ParamValue::Map(row)]);

        // Top level.
        let mut input = ParamMap::new();
        input.insert("values", values.clone());
        let flat = flatten(&input);
        assert_eq!(flat.len(), 1);
        assert!(matches!(flat.get("values"), Some(ParamValue::Str(_))));

        // Nested inside a label map.
        let mut sub = ParamMap::new();
        sub.insert("values", values);
        let mut input = ParamMap::new();
        input.insert("slices", label_map([("fresh", sub)]));
        let flat = flatten(&input);
        assert_eq!(flat.len(), 1);
        let ParamValue::Str(encoded) = flat.get("slices[fresh].values").unwrap() else {
            panic!("values must flatten to a string");
        };
        let decoded: serde_json::Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, serde_json::json!([{"_key": "alice"}]));
    }

    #[test]
    fn string_values_pass_through_unserialized() {
        let mut input = ParamMap::new();
        input.insert("values", "[[1,2,3]]");
        let flat = flatten(&input);
        assert_eq!(
            flat.get("values"),
            Some(&ParamValue::Str("[[1,2,3]]".into()))
        );
    }

    #[test]
    fn times_inside_values_encode_as_epoch_seconds() {
        let stamp = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut row = ParamMap::new();
        row.insert("_key", "alice");
        row.insert("birthday", stamp);
        let mut input = ParamMap::new();
        input.insert("values", ParamValue::List(vec![ParamValue::Map(row)]));

        let flat = flatten(&input);
        let ParamValue::Str(encoded) = flat.get("values").unwrap() else {
            panic!("values must flatten to a string");
        };
        let decoded: serde_json::Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded[0]["birthday"], serde_json::json!(1_700_000_000.0));
    }

    #[test]
    fn empty_label_maps_emit_nothing() {
        let mut input = ParamMap::new();
        input.insert("drilldowns", ParamMap::new());
        assert!(flatten(&input).is_empty());
    }

    #[test]
    fn accumulation_onto_a_seeded_mapping() {
        let mut out = FlatParams::new();
        out.insert("table", "Users");

        let mut input = ParamMap::new();
        input.insert("limit", 5i64);
        flatten_into(&mut out, &input, "");

        assert_eq!(out.len(), 2);
        assert_eq!(out.get("table"), Some(&ParamValue::Str("Users".into())));
        assert_eq!(out.get("limit"), Some(&ParamValue::Int(5)));
    }

    // Splits a flattened key back into its label path, undoing the bracket/dot
    // encoding. Only used to check the round-trip property below.
    fn reparse_key(key: &str) -> Vec<(String, Option<String>)> {
        key.split('.')
            .map(|segment| match segment.split_once('[') {
                Some((name, rest)) => (
                    name.to_string(),
                    Some(rest.trim_end_matches(']').to_string()),
                ),
                None => (segment.to_string(), None),
            })
            .collect()
    }

    #[test]
    fn flattened_keys_reconstruct_the_label_structure() {
        let mut inner = ParamMap::new();
        inner.insert("keys", "tag");
        inner.insert("limit", 3i64);
        let mut input = ParamMap::new();
        input.insert("table", "Memos");
        input.insert("drilldowns", label_map([("tags", inner)]));

        let flat = flatten(&input);
        let mut rebuilt = ParamMap::new();
        for (key, value) in flat.iter() {
            let path = reparse_key(key);
            match path.as_slice() {
                [(name, None)] => rebuilt.insert(name.clone(), value.clone()),
                [(name, Some(label)), (sub, None)] => {
                    if !rebuilt.contains_key(name) {
                        rebuilt.insert(name.clone(), ParamMap::new());
                    }
                    let Some(ParamValue::Map(labels)) = rebuilt.get_mut(name) else {
                        unreachable!()
                    };
                    if !labels.contains_key(label) {
                        labels.insert(label.clone(), ParamMap::new());
                    }
                    let Some(ParamValue::Map(sub_map)) = labels.get_mut(label) else {
                        unreachable!()
                    };
                    sub_map.insert(sub.clone(), value.clone());
                }
                other => panic!("unexpected key shape: {other:?}"),
            }
        }
        assert_eq!(rebuilt, input);
    }
}
