//! Tests for string functions

#[cfg(test)]
mod tests {
    use super::super::string::StringUtils;
    use super::super::tests::{call, call_with};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_case_functions() {
        assert_eq!(call_with("uppercase", vec![json!("abc")]).unwrap(), Some(json!("ABC")));
        assert_eq!(call_with("lowercase", vec![json!("ÀBC")]).unwrap(), Some(json!("àbc")));
        assert_eq!(
            call_with("capitalize", vec![json!("hello world")]).unwrap(),
            Some(json!("Hello world"))
        );
        assert_eq!(call_with("capitalize", vec![json!("")]).unwrap(), Some(json!("")));
        // Numbers are coerced to text
        assert_eq!(call_with("uppercase", vec![json!(42)]).unwrap(), Some(json!("42")));
    }

    #[test]
    fn test_trim_function() {
        assert_eq!(
            call_with("trim", vec![json!("  padded \n")]).unwrap(),
            Some(json!("padded"))
        );
    }

    #[test]
    fn test_missing_argument_is_error() {
        assert!(call("uppercase", vec![]).is_err());
        assert!(call("uppercase", vec![None]).is_err());
    }

    #[test]
    fn test_substring_function() {
        assert_eq!(
            call_with("substring", vec![json!("abcdef"), json!(1), json!(3)]).unwrap(),
            Some(json!("bc"))
        );
        assert_eq!(
            call_with("substring", vec![json!("abcdef"), json!(2)]).unwrap(),
            Some(json!("cdef"))
        );
        // Swapped and negative bounds
        assert_eq!(StringUtils::substring("abcdef", 4.0, Some(1.0)), "bcd");
        assert_eq!(StringUtils::substring("abcdef", -3.0, Some(2.0)), "ab");
        assert_eq!(StringUtils::substring("héllo", 1.0, Some(2.0)), "é");
        assert_eq!(StringUtils::substring("abc", 10.0, None), "");
    }

    #[test]
    fn test_replace_function() {
        assert_eq!(
            call_with("replace", vec![json!("a-b-c"), json!("-"), json!("_")]).unwrap(),
            Some(json!("a_b_c"))
        );
        assert_eq!(
            call_with("replace", vec![json!("abc"), json!(""), json!("x")]).unwrap(),
            Some(json!("abc"))
        );
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(
            call_with("split", vec![json!("a,b,c"), json!(",")]).unwrap(),
            Some(json!(["a", "b", "c"]))
        );
        assert_eq!(
            call_with("split", vec![json!("abc"), json!("")]).unwrap(),
            Some(json!(["a", "b", "c"]))
        );
        assert_eq!(call_with("split", vec![json!("abc")]).unwrap(), Some(json!(["abc"])));

        assert_eq!(
            call_with("join", vec![json!(["a", 1, true, null])]).unwrap(),
            Some(json!("a,1,true,"))
        );
        assert_eq!(
            call_with("join", vec![json!(["x", "y"]), json!(" - ")]).unwrap(),
            Some(json!("x - y"))
        );
        assert!(call_with("join", vec![json!("not an array")]).is_err());
    }

    #[test]
    fn test_length_function() {
        assert_eq!(call_with("length", vec![json!("héllo")]).unwrap(), Some(json!(5)));
        assert_eq!(call_with("length", vec![json!([1, 2, 3])]).unwrap(), Some(json!(3)));
        assert_eq!(call_with("length", vec![json!({"a": 1})]).unwrap(), Some(json!(1)));
        assert_eq!(call_with("length", vec![json!(1234)]).unwrap(), Some(json!(4)));
    }

    #[test]
    fn test_concat_function() {
        assert_eq!(
            call_with("concat", vec![json!("a"), json!(1), json!(" "), json!(true)]).unwrap(),
            Some(json!("a1 true"))
        );
        // Undefined arguments are skipped
        assert_eq!(
            call("concat", vec![Some(json!("a")), None, Some(json!("b"))]).unwrap(),
            Some(json!("ab"))
        );
        assert_eq!(call_with("concat", vec![]).unwrap(), Some(json!("")));
    }
}
