//! Tests for numeric functions

#[cfg(test)]
mod tests {
    use super::super::math::ArithmeticOperations;
    use super::super::tests::call_with;
    use crate::core::TP0054;
    use serde_json::json;

    #[test]
    fn test_add_and_multiply_are_variadic() {
        assert_eq!(call_with("add", vec![json!(2), json!(3)]).unwrap(), Some(json!(5)));
        assert_eq!(
            call_with("add", vec![json!(1), json!("2"), json!(3.5)]).unwrap(),
            Some(json!(6.5))
        );
        assert_eq!(call_with("add", vec![json!([1, 2, 3])]).unwrap(), Some(json!(6)));
        assert_eq!(
            call_with("multiply", vec![json!(2), json!(3), json!(4)]).unwrap(),
            Some(json!(24))
        );
        assert!(call_with("add", vec![json!(1), json!("abc")]).is_err());
    }

    #[test]
    fn test_subtract_and_divide() {
        assert_eq!(call_with("subtract", vec![json!(10), json!(4)]).unwrap(), Some(json!(6)));
        assert_eq!(call_with("divide", vec![json!(10), json!(4)]).unwrap(), Some(json!(2.5)));
        assert_eq!(call_with("divide", vec![json!(9), json!(3)]).unwrap(), Some(json!(3)));
        assert_eq!(call_with("mod", vec![json!(10), json!(3)]).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        let err = call_with("divide", vec![json!(1), json!(0)]).unwrap_err();
        assert_eq!(err.error_code(), TP0054);
        assert!(call_with("mod", vec![json!(1), json!(0)]).is_err());
    }

    #[test]
    fn test_rounding_functions() {
        assert_eq!(call_with("round", vec![json!(2.5)]).unwrap(), Some(json!(3)));
        assert_eq!(call_with("round", vec![json!(2.567), json!(2)]).unwrap(), Some(json!(2.57)));
        assert_eq!(call_with("floor", vec![json!(2.7)]).unwrap(), Some(json!(2)));
        assert_eq!(call_with("ceil", vec![json!(2.1)]).unwrap(), Some(json!(3)));
        assert_eq!(call_with("abs", vec![json!(-4)]).unwrap(), Some(json!(4)));
        assert_eq!(ArithmeticOperations::round(-2.5, 0), -2.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(call_with("min", vec![json!(3), json!(1), json!(2)]).unwrap(), Some(json!(1)));
        assert_eq!(call_with("max", vec![json!([3, 9, 2])]).unwrap(), Some(json!(9)));
        assert_eq!(call_with("max", vec![json!([])]).unwrap(), None);
    }

    #[test]
    fn test_random_ranges() {
        for _ in 0..50 {
            let value = call_with("random", vec![]).unwrap().unwrap().as_f64().unwrap();
            assert!((0.0..1.0).contains(&value));

            let value = call_with("randomInt", vec![json!(1), json!(3)])
                .unwrap()
                .unwrap()
                .as_i64()
                .unwrap();
            assert!((1..=3).contains(&value));
        }
        assert_eq!(call_with("randomInt", vec![json!(5), json!(5)]).unwrap(), Some(json!(5)));
        assert!(call_with("randomInt", vec![json!(5), json!(1)]).is_err());
    }

    #[test]
    fn test_random_rejects_non_finite_ranges() {
        let err = call_with("random", vec![json!("NaN"), json!(1)]).unwrap_err();
        assert_eq!(err.error_code(), TP0054);
        assert!(call_with("random", vec![json!(0), json!("Infinity")]).is_err());
        assert!(call_with("random", vec![json!("-1e308"), json!("1e308")]).is_err());
        assert!(call_with("randomInt", vec![json!("NaN"), json!(1)]).is_err());

        let value = call_with("random", vec![json!(-1e300), json!(1e300)])
            .unwrap()
            .unwrap()
            .as_f64()
            .unwrap();
        assert!(value.is_finite());
    }
}
