//! StructuredValue <-> JavaScript Value Conversions
//!
//! This module is the value codec of the boundary: it turns Boa `JsValue`s
//! handed to the module into [`StructuredValue`]s and back.
//!
//! # Type Mapping
//!
//! | JavaScript Type | StructuredValue |
//! |-----------------|-----------------|
//! | null | `Null` |
//! | Boolean | `Bool` |
//! | Number (whole, within ±(2^53 − 1), not -0) | `Integer` |
//! | Number (anything else, including NaN) | `Number` |
//! | BigInt fitting in i64 | `Integer` |
//! | String | `String` |
//! | Array | `Sequence` |
//! | plain Object (prototype is `Object.prototype` or null) | `Mapping` |
//!
//! Encoding goes the other way; integers outside the safe range become BigInts
//! so they are never rounded.
//!
//! # Limitations
//!
//! - `undefined`, functions, symbols, BigInts beyond i64 and non-plain objects
//!   (Date, Map, class instances, ...) are rejected as unsupported types
//! - Symbol keys and non-enumerable properties are skipped, as with
//!   `JSON.stringify`
//! - Nesting deeper than the configured limit is rejected, which also stops
//!   cyclic object graphs

use boa_engine::{
    js_string,
    object::{builtins::JsArray, JsObject, ObjectInitializer},
    property::{Attribute, PropertyKey},
    Context, JsBigInt, JsError, JsNativeError, JsString, JsValue,
};
use hostcall_common::{ErrorInfo, ErrorKind, HostcallError, Result, StructuredValue};
use std::collections::BTreeMap;

/// Largest integer a JS number holds exactly (`Number.MAX_SAFE_INTEGER`).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Convert a Boa `JsValue` to a [`StructuredValue`].
///
/// # Arguments
///
/// * `value` - The JavaScript value to convert
/// * `ctx` - Mutable reference to the Boa context (used for property access)
/// * `max_depth` - Deepest array/object nesting accepted
///
/// # Errors
///
/// Returns `HostcallError::UnsupportedType` for values outside the supported
/// set and for nesting beyond `max_depth`, and `HostcallError::Script` if a
/// property getter throws.
pub fn js_to_structured(value: &JsValue, ctx: &mut Context, max_depth: usize) -> Result<StructuredValue> {
    decode(value, ctx, max_depth, 0)
}

fn decode(value: &JsValue, ctx: &mut Context, max_depth: usize, depth: usize) -> Result<StructuredValue> {
    if value.is_null() {
        return Ok(StructuredValue::Null);
    }

    if value.is_undefined() {
        return Err(HostcallError::UnsupportedType("undefined".into()));
    }

    if let Some(b) = value.as_boolean() {
        return Ok(StructuredValue::Bool(b));
    }

    if let Some(n) = value.as_number() {
        return Ok(number_to_structured(n));
    }

    if let Some(s) = value.as_string() {
        return s
            .to_std_string()
            .map(StructuredValue::String)
            .map_err(|_| HostcallError::UnsupportedType("string with unpaired surrogates".into()));
    }

    if let Some(big) = value.as_bigint() {
        return big
            .to_string()
            .parse::<i64>()
            .map(StructuredValue::Integer)
            .map_err(|_| HostcallError::UnsupportedType("BigInt outside the 64-bit integer range".into()));
    }

    if value.is_symbol() {
        return Err(HostcallError::UnsupportedType("symbol".into()));
    }

    if let Some(obj) = value.as_object() {
        return decode_object(&obj, ctx, max_depth, depth + 1);
    }

    Err(HostcallError::UnsupportedType("unknown value".into()))
}

fn number_to_structured(n: f64) -> StructuredValue {
    let negative_zero = n == 0.0 && n.is_sign_negative();
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 && !negative_zero {
        StructuredValue::Integer(n as i64)
    } else {
        StructuredValue::Number(n)
    }
}

fn decode_object(obj: &JsObject, ctx: &mut Context, max_depth: usize, depth: usize) -> Result<StructuredValue> {
    if depth > max_depth {
        return Err(HostcallError::UnsupportedType(format!(
            "value nested deeper than {} levels",
            max_depth
        )));
    }

    if obj.is_callable() {
        return Err(HostcallError::UnsupportedType("function".into()));
    }

    if obj.is_array() {
        let array = JsArray::from_object(obj.clone()).map_err(script_error)?;

        let length: usize = array
            .length(ctx)
            .map_err(script_error)?
            .try_into()
            .map_err(|_| HostcallError::UnsupportedType("array length overflows usize".into()))?;

        let mut items = Vec::with_capacity(length.min(1024));
        for i in 0..length {
            let elem = array.get(i, ctx).map_err(script_error)?;
            items.push(decode(&elem, ctx, max_depth, depth)?);
        }
        return Ok(StructuredValue::Sequence(items));
    }

    if !is_plain_object(obj, ctx) {
        return Err(HostcallError::UnsupportedType("object with a non-plain prototype".into()));
    }

    let keys = obj.own_property_keys(ctx).map_err(script_error)?;
    let object_proto = ctx.intrinsics().constructors().object().prototype();
    let is_enumerable = object_proto
        .get(js_string!("propertyIsEnumerable"), ctx)
        .map_err(script_error)?;
    let is_enumerable = is_enumerable
        .as_object()
        .filter(|obj| obj.is_callable())
        .map(|obj| obj.clone())
        .ok_or_else(|| HostcallError::Internal("Object.prototype.propertyIsEnumerable is not callable".into()))?;

    let mut map = BTreeMap::new();
    for key in keys {
        let name = match &key {
            PropertyKey::String(s) => s.to_std_string().map_err(|_| {
                HostcallError::UnsupportedType("property name with unpaired surrogates".into())
            })?,
            PropertyKey::Index(i) => i.get().to_string(),
            PropertyKey::Symbol(_) => continue,
        };

        let enumerable = is_enumerable
            .call(&JsValue::from(obj.clone()), &[JsValue::new(JsString::from(name.as_str()))], ctx)
            .map_err(script_error)?;
        if !enumerable.to_boolean() {
            continue;
        }

        let prop = obj.get(key, ctx).map_err(script_error)?;
        map.insert(name, decode(&prop, ctx, max_depth, depth)?);
    }

    Ok(StructuredValue::Mapping(map))
}

fn is_plain_object(obj: &JsObject, ctx: &Context) -> bool {
    match obj.prototype() {
        None => true,
        Some(proto) => {
            let object_proto = ctx.intrinsics().constructors().object().prototype();
            JsObject::equals(&proto, &object_proto)
        }
    }
}

/// Convert a [`StructuredValue`] to a Boa `JsValue`.
///
/// Total: every structured value has a JavaScript form.
pub fn structured_to_js(value: StructuredValue, ctx: &mut Context) -> JsValue {
    match value {
        StructuredValue::Null => JsValue::null(),
        StructuredValue::Bool(b) => JsValue::new(b),
        StructuredValue::Integer(i) => integer_to_js(i),
        StructuredValue::Number(n) => JsValue::new(n),
        StructuredValue::String(s) => JsValue::new(JsString::from(s.as_str())),
        StructuredValue::Sequence(items) => {
            let values: Vec<JsValue> = items
                .into_iter()
                .map(|item| structured_to_js(item, ctx))
                .collect();
            JsArray::from_iter(values, ctx).into()
        }
        StructuredValue::Mapping(map) => {
            // children first: the initializer holds the context borrow
            let entries: Vec<(JsString, JsValue)> = map
                .into_iter()
                .map(|(key, value)| (JsString::from(key.as_str()), structured_to_js(value, ctx)))
                .collect();

            let mut init = ObjectInitializer::new(ctx);
            for (key, value) in entries {
                init.property(key, value, Attribute::all());
            }
            init.build().into()
        }
    }
}

fn integer_to_js(i: i64) -> JsValue {
    if let Ok(small) = i32::try_from(i) {
        JsValue::new(small)
    } else if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
        JsValue::new(i as f64)
    } else {
        JsValue::new(JsBigInt::from(i))
    }
}

/// Builds the JavaScript `Error` handed to the host for a failed computation:
/// `message` is the error text and `code` names its kind.
pub fn error_to_js(info: &ErrorInfo, ctx: &mut Context) -> JsValue {
    let error = JsNativeError::error()
        .with_message(info.message.clone())
        .to_opaque(ctx);

    if let Err(e) = error.create_data_property_or_throw(
        js_string!("code"),
        JsString::from(info.kind.code()),
        ctx,
    ) {
        tracing::warn!("Failed to set error code: {e}");
    }

    error.into()
}

/// Same as [`error_to_js`], wrapped so a native function can throw it.
pub fn error_to_throw(info: &ErrorInfo, ctx: &mut Context) -> JsError {
    JsError::from_opaque(error_to_js(info, ctx))
}

/// Reads an [`ErrorInfo`] back out of an error built by [`error_to_js`].
///
/// Returns `None` for values without a recognised `code`.
pub fn error_info_from_js(value: &JsValue, ctx: &mut Context) -> Option<ErrorInfo> {
    let obj = value.as_object()?;

    let code = obj.get(js_string!("code"), ctx).ok()?;
    let kind = ErrorKind::from_code(&code.as_string()?.to_std_string_escaped())?;

    let message = obj.get(js_string!("message"), ctx).ok()?;
    let message = message.as_string()?.to_std_string_escaped();

    Some(ErrorInfo::new(kind, message))
}

pub(crate) fn script_error(e: JsError) -> HostcallError {
    HostcallError::Script(e.to_string())
}

/// Like [`script_error`], but reads the message off thrown `Error` objects.
pub(crate) fn thrown_error(e: JsError, ctx: &mut Context) -> HostcallError {
    match e.try_native(ctx) {
        Ok(native) => HostcallError::Script(native.to_string()),
        Err(_) => script_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_engine::Source;
    use serde_json::json;

    const DEPTH: usize = 64;

    fn eval(ctx: &mut Context, source: &str) -> JsValue {
        ctx.eval(Source::from_bytes(source)).unwrap()
    }

    fn decode_source(ctx: &mut Context, source: &str) -> Result<StructuredValue> {
        let value = eval(ctx, source);
        js_to_structured(&value, ctx, DEPTH)
    }

    fn round_trip(value: StructuredValue) -> StructuredValue {
        let mut ctx = Context::default();
        let js = structured_to_js(value, &mut ctx);
        js_to_structured(&js, &mut ctx, DEPTH).unwrap()
    }

    #[test]
    fn test_round_trip_scalars() {
        for value in [
            StructuredValue::Null,
            StructuredValue::Bool(true),
            StructuredValue::Bool(false),
            StructuredValue::Integer(0),
            StructuredValue::Integer(-42),
            StructuredValue::Number(1.5),
            StructuredValue::Number(-0.0),
            StructuredValue::Number(f64::NAN),
            StructuredValue::Number(f64::INFINITY),
            StructuredValue::from(""),
            StructuredValue::from("héllo ✓"),
        ] {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_round_trip_nested() {
        let value = StructuredValue::from(json!({
            "id": "me",
            "values": [1, 2, 3],
            "x": 1.0,
            "sub": {"id": "sub", "flag": true, "deeper": [[], {}, [null]]}
        }));
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_large_integers_round_trip_through_bigint() {
        for i in [i64::MAX, i64::MIN, MAX_SAFE_INTEGER + 1, -(MAX_SAFE_INTEGER + 1)] {
            let mut ctx = Context::default();
            let js = structured_to_js(StructuredValue::Integer(i), &mut ctx);
            assert!(js.is_bigint(), "{} should encode as BigInt", i);
            assert!(matches!(js_to_structured(&js, &mut ctx, DEPTH).unwrap(), StructuredValue::Integer(j) if j == i));
        }
    }

    #[test]
    fn test_safe_integers_encode_as_numbers() {
        let mut ctx = Context::default();
        let js = structured_to_js(StructuredValue::Integer(MAX_SAFE_INTEGER), &mut ctx);
        assert!(js.is_number());
        let js = structured_to_js(StructuredValue::Integer(7), &mut ctx);
        assert_eq!(js.as_number(), Some(7.0));
    }

    #[test]
    fn test_decode_numbers() {
        let mut ctx = Context::default();
        assert!(matches!(decode_source(&mut ctx, "13").unwrap(), StructuredValue::Integer(13)));
        assert!(matches!(decode_source(&mut ctx, "13.0").unwrap(), StructuredValue::Integer(13)));
        assert!(matches!(decode_source(&mut ctx, "2.5").unwrap(), StructuredValue::Number(n) if n == 2.5));
        assert!(matches!(decode_source(&mut ctx, "-0").unwrap(), StructuredValue::Number(n) if n == 0.0 && n.is_sign_negative()));
        assert!(matches!(decode_source(&mut ctx, "2 ** 60").unwrap(), StructuredValue::Number(_)));
    }

    #[test]
    fn test_decode_bigint() {
        let mut ctx = Context::default();
        assert!(matches!(decode_source(&mut ctx, "12345678901234567n").unwrap(), StructuredValue::Integer(12345678901234567)));
        let err = decode_source(&mut ctx, "2n ** 100n").unwrap_err();
        assert!(matches!(err, HostcallError::UnsupportedType(_)));
    }

    #[test]
    fn test_decode_plain_object_from_script() {
        let mut ctx = Context::default();
        let value = decode_source(&mut ctx, "({id: 'me', values: [1, 2, 3], sub: {flag: true}, 0: 'zero'})").unwrap();
        assert_eq!(
            value,
            StructuredValue::from(json!({"id": "me", "values": [1, 2, 3], "sub": {"flag": true}, "0": "zero"}))
        );
    }

    #[test]
    fn test_null_prototype_object_is_plain() {
        let mut ctx = Context::default();
        let value = decode_source(&mut ctx, "const o = Object.create(null); o.a = 1; o").unwrap();
        assert_eq!(value, StructuredValue::from(json!({"a": 1})));
    }

    #[test]
    fn test_symbol_keys_are_skipped() {
        let mut ctx = Context::default();
        let value = decode_source(&mut ctx, "({a: 1, [Symbol('s')]: 2})").unwrap();
        assert_eq!(value, StructuredValue::from(json!({"a": 1})));
    }

    #[test]
    fn test_non_enumerable_properties_are_skipped() {
        let mut ctx = Context::default();
        let value = decode_source(
            &mut ctx,
            "const o = {a: 1}; Object.defineProperty(o, 'h', {value: 2}); Object.defineProperty(o, 1, {value: 3}); o",
        )
        .unwrap();
        assert_eq!(value, StructuredValue::from(json!({"a": 1})));

        let value = decode_source(&mut ctx, "const n = Object.create(null); Object.defineProperty(n, 'h', {value: 1}); n.b = 2; n")
            .unwrap();
        assert_eq!(value, StructuredValue::from(json!({"b": 2})));
    }

    #[test]
    fn test_unsupported_types_are_rejected() {
        let mut ctx = Context::default();
        for source in [
            "undefined",
            "(function () {})",
            "Symbol('s')",
            "new Date(0)",
            "new Map()",
            "new Error('x')",
            "class A {}; new A()",
            "[1, () => 2]",
            "({nested: {f() {}}})",
        ] {
            let err = decode_source(&mut ctx, source).unwrap_err();
            assert!(
                matches!(err, HostcallError::UnsupportedType(_)),
                "expected unsupported type for {}, got {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_cyclic_object_hits_depth_limit() {
        let mut ctx = Context::default();
        let err = decode_source(&mut ctx, "const a = {}; a.self = a; a").unwrap_err();
        assert!(matches!(err, HostcallError::UnsupportedType(ref m) if m.contains("nested deeper")));
    }

    #[test]
    fn test_depth_limit_boundary() {
        let mut ctx = Context::default();
        let value = eval(&mut ctx, "({a: {b: 1}})");
        assert!(js_to_structured(&value, &mut ctx, 2).is_ok());
        assert!(js_to_structured(&value, &mut ctx, 1).is_err());
    }

    #[test]
    fn test_throwing_getter_is_script_error() {
        let mut ctx = Context::default();
        let err = decode_source(&mut ctx, "({get bad() { throw new Error('nope'); }})").unwrap_err();
        assert!(matches!(err, HostcallError::Script(_)));
    }

    #[test]
    fn test_encoded_object_is_visible_to_script() {
        let mut ctx = Context::default();
        let obj = structured_to_js(StructuredValue::from(json!({"id": "me", "n": [1, 2]})), &mut ctx);
        ctx.register_global_property(js_string!("encoded"), obj, Attribute::all()).unwrap();

        let check = eval(&mut ctx, "encoded.id === 'me' && Array.isArray(encoded.n) && encoded.n[1] === 2");
        assert_eq!(check.as_boolean(), Some(true));
    }

    #[test]
    fn test_error_object_round_trip() {
        let mut ctx = Context::default();
        let info = ErrorInfo::new(ErrorKind::NegativeArgument, "argument cannot be negative");
        let error = error_to_js(&info, &mut ctx);
        ctx.register_global_property(js_string!("err"), error.clone(), Attribute::all()).unwrap();

        let check = eval(
            &mut ctx,
            "err instanceof Error && err.message === 'argument cannot be negative' && err.code === 'NegativeArgumentError'",
        );
        assert_eq!(check.as_boolean(), Some(true));
        assert_eq!(error_info_from_js(&error, &mut ctx), Some(info));
    }

    #[test]
    fn test_error_info_from_plain_error_is_none() {
        let mut ctx = Context::default();
        let error = eval(&mut ctx, "new TypeError('bad')");
        assert_eq!(error_info_from_js(&error, &mut ctx), None);
    }
}
