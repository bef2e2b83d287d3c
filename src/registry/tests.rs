//! Tests for the function registry system

use super::*;

/// Evaluator that only resolves bare binding names, enough for `filter`/`map`
pub(super) struct BindingEvaluator;

impl ScopedEvaluator for BindingEvaluator {
    fn evaluate_scoped(
        &self,
        expression: &str,
        bindings: Vec<(String, Value)>,
    ) -> Result<Option<Value>> {
        let expression = expression.trim();
        if let Some(rest) = expression.strip_prefix("item.") {
            return Ok(bindings
                .into_iter()
                .find(|(name, _)| name == "item")
                .and_then(|(_, item)| item.get(rest).cloned()));
        }
        Ok(bindings
            .into_iter()
            .find(|(name, _)| name == expression)
            .map(|(_, value)| value))
    }
}

/// Invoke a built-in from the standard registry
pub(super) fn call(name: &str, arguments: Vec<Option<Value>>) -> Result<Option<Value>> {
    let registry = standard_registry();
    let function = registry
        .get_function(name)
        .ok_or_else(|| TemplateError::function_not_found(name))?;
    let context = FunctionContext::new(name, &arguments, &BindingEvaluator);
    function(&context)
}

/// Invoke with every argument defined
pub(super) fn call_with(name: &str, arguments: Vec<Value>) -> Result<Option<Value>> {
    call(name, arguments.into_iter().map(Some).collect())
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::call_with;
    use crate::core::{TP0054, TP0055};
    use serde_json::json;

    fn metadata(name: &str) -> FunctionMetadata {
        FunctionMetadata {
            name: name.to_string(),
            category: FunctionCategory::Custom,
            description: "Test function".to_string(),
            parameters: vec![],
            return_type: Some("boolean".to_string()),
            examples: vec![],
            is_pure: true,
        }
    }

    #[test]
    fn test_function_registration() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_empty());

        let test_function: SyncFunction =
            Arc::new(|_context: &FunctionContext| -> Result<Option<Value>> { Ok(Some(json!(true))) });

        assert!(
            registry
                .register_sync_function("test", test_function, metadata("test"))
                .is_ok()
        );
        assert!(registry.get_function("test").is_some());
        assert!(registry.contains("test"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_function_registration() {
        let registry = FunctionRegistry::new();
        let first: SyncFunction = Arc::new(|_: &FunctionContext| -> Result<Option<Value>> { Ok(None) });
        let second: SyncFunction = Arc::new(|_: &FunctionContext| -> Result<Option<Value>> { Ok(None) });

        registry
            .register_sync_function("dup", first, metadata("dup"))
            .unwrap();
        let err = registry
            .register_sync_function("dup", second, metadata("dup"))
            .unwrap_err();
        assert_eq!(err.error_code(), TP0055);
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = FunctionRegistry::default();
        for name in [
            "uppercase", "add", "now", "base64", "sha256", "uuid", "filter", "keys", "if",
            "isString", "faker.email",
        ] {
            assert!(registry.contains(name), "missing built-in {name}");
        }
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn test_purity_flags() {
        let registry = standard_registry();
        for impure in [
            "random", "randomInt", "now", "timestamp", "date", "uuid", "guid", "shortId",
            "faker.name", "faker.boolean",
        ] {
            assert!(!registry.is_pure(impure), "{impure} should be impure");
        }
        for pure in ["uppercase", "add", "sha256", "dateAdd", "map"] {
            assert!(registry.is_pure(pure), "{pure} should be pure");
        }
        assert!(!registry.is_pure("unknown"));
    }

    #[test]
    fn test_metadata_and_categories() {
        let registry = standard_registry();
        let substring = registry.get_function_metadata("substring").unwrap();
        assert_eq!(substring.category, FunctionCategory::String);
        assert_eq!(substring.parameters.len(), 3);
        assert!(substring.parameters[2].is_optional);
        assert!(!substring.parameters[0].is_optional);

        let fakes = registry.list_functions_by_category(FunctionCategory::FakeData);
        assert_eq!(fakes.len(), 10);
        assert!(fakes.iter().all(|m| m.name.starts_with("faker.")));

        let names: Vec<_> = registry.list_functions().into_iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_encoding_functions() {
        assert_eq!(call_with("base64", vec![json!("hello")]).unwrap(), Some(json!("aGVsbG8=")));
        assert_eq!(
            call_with("base64Decode", vec![json!("aGVsbG8=")]).unwrap(),
            Some(json!("hello"))
        );
        assert!(call_with("base64Decode", vec![json!("%%%")]).is_err());
        assert_eq!(
            call_with("urlEncode", vec![json!("a b&c=d")]).unwrap(),
            Some(json!("a%20b%26c%3Dd"))
        );
        assert_eq!(
            call_with("urlDecode", vec![json!("a%20b%26c")]).unwrap(),
            Some(json!("a b&c"))
        );
        assert_eq!(
            call_with("htmlEncode", vec![json!("<a href=\"x\">&</a>")]).unwrap(),
            Some(json!("&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"))
        );
        assert_eq!(
            call_with("htmlDecode", vec![json!("&lt;b&gt; &amp; &quot;")]).unwrap(),
            Some(json!("<b> & \""))
        );
        assert_eq!(
            call_with("jsonEncode", vec![json!({"a": [1, 2]})]).unwrap(),
            Some(json!("{\"a\":[1,2]}"))
        );
        assert_eq!(
            call_with("jsonDecode", vec![json!("{\"a\":1}")]).unwrap(),
            Some(json!({"a": 1}))
        );
        assert!(call_with("jsonDecode", vec![json!("{oops")]).is_err());
    }

    #[test]
    fn test_hash_functions() {
        assert_eq!(
            call_with("md5", vec![json!("hello")]).unwrap(),
            Some(json!("5d41402abc4b2a76b9719d911017c592"))
        );
        assert_eq!(
            call_with("sha1", vec![json!("hello")]).unwrap(),
            Some(json!("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"))
        );
        assert_eq!(
            call_with("sha256", vec![json!("hello")]).unwrap(),
            Some(json!("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"))
        );
        let sha512 = call_with("sha512", vec![json!("hello")]).unwrap().unwrap();
        assert_eq!(sha512.as_str().unwrap().len(), 128);

        // RFC 4231 test case 2
        assert_eq!(
            call_with(
                "hmac",
                vec![json!("what do ya want for nothing?"), json!("Jefe")]
            )
            .unwrap(),
            Some(json!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"))
        );
        assert!(call_with("hmac", vec![json!("a"), json!("b"), json!("crc32")]).is_err());
    }

    #[test]
    fn test_identifier_functions() {
        let uuid = call_with("uuid", vec![]).unwrap().unwrap();
        assert!(uuid::Uuid::parse_str(uuid.as_str().unwrap()).is_ok());
        let guid = call_with("guid", vec![]).unwrap().unwrap();
        assert_ne!(uuid, guid);

        let short = call_with("shortId", vec![]).unwrap().unwrap();
        assert_eq!(short.as_str().unwrap().len(), 8);
        let longer = call_with("shortId", vec![json!(12)]).unwrap().unwrap();
        assert_eq!(longer.as_str().unwrap().len(), 12);
        assert!(longer.as_str().unwrap().chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(call_with("shortId", vec![json!(-3)]).unwrap(), Some(json!("")));
        let err = call_with("shortId", vec![json!("1e18")]).unwrap_err();
        assert_eq!(err.error_code(), TP0054);
        assert!(call_with("shortId", vec![json!("NaN")]).is_err());
    }

    #[test]
    fn test_object_functions() {
        let user = json!({"id": 1, "name": "Ada", "password": "secret"});
        assert_eq!(
            call_with("keys", vec![user.clone()]).unwrap(),
            Some(json!(["id", "name", "password"]))
        );
        assert_eq!(
            call_with("values", vec![json!({"a": 1, "b": "x"})]).unwrap(),
            Some(json!([1, "x"]))
        );
        assert_eq!(
            call_with("entries", vec![json!({"a": 1})]).unwrap(),
            Some(json!([["a", 1]]))
        );
        assert_eq!(
            call_with("merge", vec![json!({"a": 1, "b": 1}), json!({"b": 2, "c": 3})]).unwrap(),
            Some(json!({"a": 1, "b": 2, "c": 3}))
        );
        assert_eq!(
            call_with("pick", vec![user.clone(), json!("id"), json!("name")]).unwrap(),
            Some(json!({"id": 1, "name": "Ada"}))
        );
        assert_eq!(
            call_with("omit", vec![user, json!(["password"])]).unwrap(),
            Some(json!({"id": 1, "name": "Ada"}))
        );
        assert!(call_with("keys", vec![json!([1])]).is_err());
    }

    #[test]
    fn test_conditional_functions() {
        assert_eq!(
            call_with("if", vec![json!(true), json!("yes"), json!("no")]).unwrap(),
            Some(json!("yes"))
        );
        assert_eq!(
            call_with("if", vec![json!(""), json!("yes"), json!("no")]).unwrap(),
            Some(json!("no"))
        );
        assert_eq!(call_with("if", vec![json!(0), json!("yes")]).unwrap(), None);

        let switch = |value: Value| {
            call_with(
                "switch",
                vec![value, json!(200), json!("ok"), json!(404), json!("missing"), json!("other")],
            )
            .unwrap()
        };
        assert_eq!(switch(json!(404)), Some(json!("missing")));
        assert_eq!(switch(json!(200.0)), Some(json!("ok")));
        assert_eq!(switch(json!(500)), Some(json!("other")));
        assert_eq!(
            call_with("switch", vec![json!("x"), json!("y"), json!(1)]).unwrap(),
            None
        );

        assert_eq!(
            super::call("default", vec![None, Some(json!("fallback"))]).unwrap(),
            Some(json!("fallback"))
        );
        assert_eq!(
            call_with("default", vec![Value::Null, json!("fallback")]).unwrap(),
            Some(json!("fallback"))
        );
        assert_eq!(
            call_with("default", vec![json!(0), json!("fallback")]).unwrap(),
            Some(json!(0))
        );
        assert_eq!(super::call("exists", vec![None]).unwrap(), Some(json!(false)));
        assert_eq!(call_with("exists", vec![json!("")]).unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_type_functions() {
        assert_eq!(call_with("type", vec![json!([1])]).unwrap(), Some(json!("array")));
        assert_eq!(super::call("type", vec![None]).unwrap(), Some(json!("undefined")));
        assert_eq!(call_with("type", vec![Value::Null]).unwrap(), Some(json!("null")));
        assert_eq!(call_with("isString", vec![json!("s")]).unwrap(), Some(json!(true)));
        assert_eq!(call_with("isNumber", vec![json!("1")]).unwrap(), Some(json!(false)));
        assert_eq!(call_with("isObject", vec![json!({})]).unwrap(), Some(json!(true)));
        assert_eq!(super::call("isUndefined", vec![None]).unwrap(), Some(json!(true)));
        assert_eq!(call_with("isNull", vec![json!(false)]).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_fake_data_functions() {
        let email = call_with("faker.email", vec![]).unwrap().unwrap();
        let email = email.as_str().unwrap();
        assert!(email.contains('@'));

        let name = call_with("faker.name", vec![]).unwrap().unwrap();
        assert_eq!(name.as_str().unwrap().split(' ').count(), 2);

        let lorem = call_with("faker.lorem", vec![json!(3)]).unwrap().unwrap();
        assert_eq!(lorem.as_str().unwrap().split(' ').count(), 3);
        assert!(call_with("faker.lorem", vec![json!("1e18")]).is_err());

        let number = call_with("faker.number", vec![json!(5), json!(6)]).unwrap().unwrap();
        let number = number.as_i64().unwrap();
        assert!((5..=6).contains(&number));

        assert!(call_with("faker.boolean", vec![]).unwrap().unwrap().is_boolean());
        assert!(call_with("faker.phone", vec![]).unwrap().unwrap().is_string());
        assert!(call_with("faker.address", vec![]).unwrap().unwrap().is_string());
        assert!(call_with("faker.company", vec![]).unwrap().unwrap().is_string());
    }
}
