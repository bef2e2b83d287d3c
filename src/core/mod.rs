//! Core types shared by every component: errors and value helpers

pub mod error;
pub mod error_code;
pub mod value;

pub use error::*;
pub use value::{is_truthy, number, stringify, to_number, type_name, values_equal};
