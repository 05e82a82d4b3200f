use serde_json::{Map, Value};

use super::SubRequest;

/// Accumulated output of a batch run: an ordered list of extracted values,
/// or a mapping keyed by the originating resource id.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    List(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl Aggregate {
    pub fn list() -> Self {
        Aggregate::List(Vec::new())
    }

    pub fn keyed() -> Self {
        Aggregate::Keyed(Map::new())
    }

    /// Number of records merged so far: list entries or distinct keys.
    pub fn len(&self) -> usize {
        match self {
            Aggregate::List(values) => values.len(),
            Aggregate::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Aggregate::List(values) => Some(values),
            Aggregate::Keyed(_) => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&Map<String, Value>> {
        match self {
            Aggregate::Keyed(map) => Some(map),
            Aggregate::List(_) => None,
        }
    }

    pub fn into_list(self) -> Vec<Value> {
        match self {
            Aggregate::List(values) => values,
            Aggregate::Keyed(_) => Vec::new(),
        }
    }

    pub fn into_keyed(self) -> Map<String, Value> {
        match self {
            Aggregate::Keyed(map) => map,
            Aggregate::List(_) => Map::new(),
        }
    }
}

/// Walk `path` into `result` and merge the extracted content into the
/// aggregate. In list mode, list content is spread; in keyed mode the value
/// is stored under the request's resource id only when non-empty.
pub fn accumulate(
    aggregate: &mut Aggregate,
    request: &SubRequest,
    result: &Value,
    path: &[String],
) {
    let content = extract_path(result, path);
    match aggregate {
        Aggregate::List(values) => match content {
            Value::Array(items) => values.extend(items),
            other => values.push(other),
        },
        Aggregate::Keyed(map) => {
            if is_non_empty(&content) {
                map.insert(request.resource_id().to_string(), content);
            }
        }
    }
}

/// Descend `path` one segment at a time. A segment that does not apply to
/// the current node leaves that node unchanged rather than discarding it.
fn extract_path(result: &Value, path: &[String]) -> Value {
    let mut content = result.clone();
    for segment in path {
        content = step(content, segment);
    }
    content
}

fn step(content: Value, segment: &str) -> Value {
    match content {
        Value::Array(items) => {
            // Map every element through the segment and flatten one level.
            // `None` marks an element without the key; JSON null is a
            // present value and survives the projection.
            let mapped: Vec<Option<Value>> = items
                .iter()
                .flat_map(|item| project(item, segment))
                .collect();
            if mapped.iter().all(Option::is_none) {
                // The segment applies to no element at this level: keep the
                // data instead of emptying it.
                Value::Array(items)
            } else {
                Value::Array(mapped.into_iter().flatten().collect())
            }
        }
        Value::Object(map) => match map.get(segment).cloned() {
            Some(value) => value,
            None => Value::Object(map),
        },
        other => other,
    }
}

fn project(item: &Value, segment: &str) -> Vec<Option<Value>> {
    match item.get(segment) {
        Some(Value::Array(nested)) => nested.iter().cloned().map(Some).collect(),
        Some(value) => vec![Some(value.clone())],
        None => vec![None],
    }
}

fn is_non_empty(content: &Value) -> bool {
    match content {
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => false,
    }
}
