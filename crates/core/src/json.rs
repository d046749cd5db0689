//! JSON entry point.
//!
//! The incoming document is merged over the record's current serialized
//! state, so keys the client omits keep their values, the same way a
//! decoder writing into an existing value behaves. Fields serde skips are
//! carried over from the record as it was before the decode.

use crate::bind::bind_with;
use crate::shape::{BindTarget, Record};
use formbind_shared::{Errors, FieldError, RequestContext};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::{self, Read};
use tracing::warn;

/// Failure while decoding a JSON body.
#[derive(Debug, thiserror::Error)]
pub enum JsonBindError {
    /// Body could not be read.
    #[error("failed to read request body: {0}")]
    Io(#[from] io::Error),
    /// Body or merged document failed to decode.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

/// Decode a JSON body into the target, then validate.
///
/// A whitespace-only body or a bare `null` binds nothing. A decode failure
/// adds one `DeserializationError` and the record is still validated.
pub fn bind_json<'a, T, B>(target: T, body: B, context: &RequestContext) -> Errors
where
    T: BindTarget<'a>,
    T::Record: Serialize + DeserializeOwned,
    B: Read,
{
    bind_with(target, context, |record, errors| {
        if let Err(error) = merge_json(record, body) {
            warn!(
                target: "formbind::json",
                record = std::any::type_name::<T::Record>(),
                error = %error,
                "json body rejected"
            );
            errors.push(FieldError::deserialization(error.to_string()));
        }
    })
}

/// Merge the JSON document read from `body` into `record`.
///
/// On error the record is left untouched.
pub fn merge_json<R, B>(record: &mut R, mut body: B) -> Result<(), JsonBindError>
where
    R: Record + Serialize + DeserializeOwned,
    B: Read,
{
    let mut raw = Vec::new();
    body.read_to_end(&mut raw)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let incoming: Value = serde_json::from_slice(&raw)?;
    if incoming.is_null() {
        return Ok(());
    }
    let mut current = serde_json::to_value(&*record)?;
    merge_value(&mut current, incoming);
    let mut decoded: R = serde_json::from_value(current)?;
    decoded.restore_unserialized(record);
    *record = decoded;
    Ok(())
}

fn merge_value(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Object(existing), Value::Object(patch)) => merge_object(existing, patch),
        (slot, replacement) => *slot = replacement,
    }
}

fn merge_object(existing: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match existing.get_mut(&key) {
            Some(slot) => merge_value(slot, value),
            None => {
                existing.insert(key, value);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_objects_merge_recursively() {
        let mut current = json!({
            "name": "keep",
            "retries": 3,
            "nested": {"enabled": true, "label": "inner"}
        });
        merge_value(&mut current, json!({"retries": 5, "nested": {"label": "new"}, "extra": 1}));
        assert_eq!(
            current,
            json!({
                "name": "keep",
                "retries": 5,
                "nested": {"enabled": true, "label": "new"},
                "extra": 1
            })
        );
    }

    #[test]
    fn non_object_patches_replace_the_slot() {
        let mut current = json!({"tags": ["a", "b"], "nested": {"label": "x"}});
        merge_value(&mut current, json!({"tags": ["c"], "nested": "flat"}));
        assert_eq!(current, json!({"tags": ["c"], "nested": "flat"}));
    }
}
