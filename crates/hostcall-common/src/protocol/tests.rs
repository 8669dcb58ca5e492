//! Tests for the protocol module
//!
//! These cover value equality, serialization, request ids, outcome
//! exclusivity and error messages.

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashSet};

    fn sample_object() -> StructuredValue {
        let mut sub = BTreeMap::new();
        sub.insert("id".to_string(), StructuredValue::from("sub"));
        sub.insert("flag".to_string(), StructuredValue::Bool(true));

        let mut map = BTreeMap::new();
        map.insert("id".to_string(), StructuredValue::from("me"));
        map.insert("values".to_string(), StructuredValue::from(vec![1i64, 2, 3]));
        map.insert("x".to_string(), StructuredValue::Number(1.0));
        map.insert("sub".to_string(), StructuredValue::Mapping(sub));
        StructuredValue::Mapping(map)
    }

    #[test]
    fn test_integer_equals_integral_number() {
        assert_eq!(StructuredValue::Integer(2), StructuredValue::Number(2.0));
        assert_eq!(StructuredValue::Number(2.0), StructuredValue::Integer(2));
        assert_ne!(StructuredValue::Integer(2), StructuredValue::Number(2.5));
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(StructuredValue::Number(f64::NAN), StructuredValue::Number(f64::NAN));
    }

    #[test]
    fn test_different_variants_are_not_equal() {
        assert_ne!(StructuredValue::Null, StructuredValue::Bool(false));
        assert_ne!(StructuredValue::from("1"), StructuredValue::Integer(1));
        assert_ne!(
            StructuredValue::Sequence(vec![]),
            StructuredValue::Mapping(BTreeMap::new())
        );
    }

    #[test]
    fn test_as_integer_accepts_whole_numbers_only() {
        assert_eq!(StructuredValue::Integer(13).as_integer(), Some(13));
        assert_eq!(StructuredValue::Number(13.0).as_integer(), Some(13));
        assert_eq!(StructuredValue::Number(-13.0).as_integer(), Some(-13));
        assert_eq!(StructuredValue::Number(13.5).as_integer(), None);
        assert_eq!(StructuredValue::Number(f64::INFINITY).as_integer(), None);
        assert_eq!(StructuredValue::Number(1e300).as_integer(), None);
        assert_eq!(StructuredValue::from("13").as_integer(), None);
    }

    #[test]
    fn test_json_deserialization_picks_integer_for_whole_numbers() {
        let value: StructuredValue = serde_json::from_value(json!({"n": 5, "x": 1.5})).unwrap();
        assert!(matches!(value.get("n"), Some(StructuredValue::Integer(5))));
        assert!(matches!(value.get("x"), Some(StructuredValue::Number(n)) if *n == 1.5));
    }

    #[test]
    fn test_json_conversion_preserves_nested_structure() {
        let json = json!({"id": "me", "values": [1, 2, 3], "x": 1.0, "sub": {"id": "sub", "flag": true}});
        let value = StructuredValue::from(json.clone());
        assert_eq!(value, sample_object());
        assert_eq!(serde_json::Value::from(value), json);
    }

    #[test]
    fn test_display_renders_json() {
        assert_eq!(StructuredValue::from(vec![1i64, 2]).to_string(), "[1,2]");
        assert_eq!(StructuredValue::from("hi").to_string(), "\"hi\"");
    }

    #[test]
    fn test_get_on_non_mapping_is_none() {
        assert!(StructuredValue::Integer(1).get("id").is_none());
        assert_eq!(sample_object().get("id"), Some(&StructuredValue::from("me")));
    }

    #[test]
    fn test_request_creation() {
        let req = ComputationRequest::new(Operation::Fibonacci, StructuredValue::Integer(13), CallMode::Async);
        assert_eq!(req.operation, Operation::Fibonacci);
        assert_eq!(req.args, StructuredValue::Integer(13));
        assert_eq!(req.mode, CallMode::Async);
    }

    #[test]
    fn test_task_id_uniqueness() {
        let ids: HashSet<_> = (0..1000)
            .map(|_| ComputationRequest::new(Operation::Hello, StructuredValue::Null, CallMode::Sync).id)
            .collect();
        assert_eq!(ids.len(), 1000, "All task IDs should be unique");
    }

    #[test]
    fn test_task_id_uniqueness_across_threads() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let ids = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let id = requests::next_task_id();
                        ids.lock().unwrap().insert(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ids.lock().unwrap().len(), 4000);
    }

    #[test]
    fn test_operation_names_and_aliases() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("fibonacciSync".parse::<Operation>().unwrap(), Operation::Fibonacci);
        assert_eq!("fibonacci_async".parse::<Operation>().unwrap(), Operation::Fibonacci);
        assert_eq!("thread_count".parse::<Operation>().unwrap(), Operation::CpuCount);
        assert!("nope".parse::<Operation>().is_err());
    }

    #[test]
    fn test_alias_names_imply_call_mode() {
        assert_eq!(CallMode::implied_by("fibonacci_async"), Some(CallMode::Async));
        assert_eq!(CallMode::implied_by("fibonacciSync"), Some(CallMode::Sync));
        assert_eq!(CallMode::implied_by("fibonacci"), None);
        assert_eq!(CallMode::implied_by("objop"), None);
    }

    #[test]
    fn test_request_serialization_roundtrip() {
        let req = ComputationRequest::new(Operation::ObjectTransform, sample_object(), CallMode::Sync);
        let serialized = serde_json::to_value(&req).unwrap();
        assert_eq!(serialized["operation"], json!("object_transform"));
        let deserialized: ComputationRequest = serde_json::from_value(serialized).unwrap();
        assert_eq!(req, deserialized);
    }

    #[test]
    fn test_outcome_success_is_exclusive() {
        let outcome = ComputationOutcome::success(StructuredValue::from("233"));
        assert!(outcome.is_success());
        assert!(outcome.result().is_some());
        assert!(outcome.error().is_none());
        assert_eq!(outcome.into_result().unwrap(), StructuredValue::from("233"));
    }

    #[test]
    fn test_outcome_failure_is_exclusive() {
        let outcome = ComputationOutcome::failure(HostcallError::NegativeArgument);
        assert!(!outcome.is_success());
        assert!(outcome.result().is_none());
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.kind, ErrorKind::NegativeArgument);
        assert_eq!(error.message, "argument cannot be negative");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: ComputationOutcome = Ok(StructuredValue::Null).into();
        assert!(ok.is_success());
        let err: ComputationOutcome = Err(HostcallError::InvalidShape("bad".into())).into();
        assert_eq!(err.error().unwrap().kind, ErrorKind::InvalidShape);
    }

    #[test]
    fn test_malformed_outcome_payload_is_rejected() {
        let outcome: ComputationOutcome =
            serde_json::from_value(json!({"result": null, "error": null})).unwrap();
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_error_kinds_and_codes() {
        assert_eq!(HostcallError::UnsupportedType("function".into()).kind(), ErrorKind::UnsupportedType);
        assert_eq!(HostcallError::Script("boom".into()).kind(), ErrorKind::Internal);
        assert_eq!(ErrorKind::NegativeArgument.code(), "NegativeArgumentError");
        assert_eq!(ErrorKind::InvalidShape.code(), "InvalidShapeError");
        assert_eq!(ErrorKind::UnsupportedType.code(), "UnsupportedTypeError");
        assert_eq!(ErrorKind::Internal.code(), "InternalError");
    }

    #[test]
    fn test_error_kind_from_code() {
        for kind in [
            ErrorKind::UnsupportedType,
            ErrorKind::NegativeArgument,
            ErrorKind::InvalidShape,
            ErrorKind::Internal,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("TypeError"), None);
    }

    #[test]
    fn test_error_info_carries_display_message() {
        let info = ErrorInfo::from(HostcallError::UnsupportedType("symbol".into()));
        assert_eq!(info.message, "unsupported type: symbol");
    }
}
