//! Object transform: suffixes the top-level identifier of a mapping.

use hostcall_common::{HostcallError, Result, StructuredValue};

pub const IDENTIFIER_KEY: &str = "id";
pub const IDENTIFIER_SUFFIX: &str = ".rs";

/// Appends [`IDENTIFIER_SUFFIX`] to the top-level `id` string of a mapping.
///
/// Only the top level is touched; nested mappings keep their own `id`.
///
/// # Errors
///
/// Returns [`HostcallError::InvalidShape`] if `value` is not a mapping or has no
/// string-valued `id`.
pub fn transform(value: StructuredValue) -> Result<StructuredValue> {
    let mut map = match value {
        StructuredValue::Mapping(map) => map,
        other => {
            return Err(HostcallError::InvalidShape(format!(
                "expected an object, got {}",
                other.type_name()
            )))
        }
    };

    match map.get_mut(IDENTIFIER_KEY) {
        Some(StructuredValue::String(id)) => id.push_str(IDENTIFIER_SUFFIX),
        _ => {
            return Err(HostcallError::InvalidShape(format!(
                "object must have a string `{}` field",
                IDENTIFIER_KEY
            )))
        }
    }

    Ok(StructuredValue::Mapping(map))
}

pub fn handle(args: StructuredValue) -> Result<StructuredValue> {
    transform(args)
}
