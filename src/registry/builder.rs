//! Function builder pattern for easy registration

use super::{FunctionCategory, FunctionMetadata, FunctionRegistry, ParameterMetadata, SyncFunction};
use crate::core::Result;

pub struct FunctionBuilder {
    name: String,
    category: FunctionCategory,
    description: String,
    parameters: Vec<ParameterMetadata>,
    return_type: Option<String>,
    examples: Vec<String>,
    is_pure: bool,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, category: FunctionCategory) -> Self {
        Self {
            name: name.into(),
            category,
            description: String::new(),
            parameters: Vec::new(),
            return_type: None,
            examples: Vec::new(),
            is_pure: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a parameter; a trailing `?` on the name marks it optional
    pub fn parameter(
        mut self,
        name: &str,
        type_constraint: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        let (name, is_optional) = match name.strip_suffix('?') {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        self.parameters.push(ParameterMetadata {
            name: name.to_string(),
            type_constraint,
            is_optional,
            description: description.into(),
        });
        self
    }

    pub fn return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Mark the function as non-deterministic (clock, randomness)
    pub fn impure(mut self) -> Self {
        self.is_pure = false;
        self
    }

    pub fn register_sync(self, registry: &FunctionRegistry, function: SyncFunction) -> Result<()> {
        let metadata = FunctionMetadata {
            name: self.name.clone(),
            category: self.category,
            description: self.description,
            parameters: self.parameters,
            return_type: self.return_type,
            examples: self.examples,
            is_pure: self.is_pure,
        };

        registry.register_sync_function(self.name, function, metadata)
    }
}

/// Convenience macro for function registration
#[macro_export]
macro_rules! register_function {
    (
        $registry:expr,
        $name:literal,
        category: $category:expr,
        description: $desc:literal,
        parameters: [$($param_name:literal : $param_type:literal => $param_desc:literal),*],
        return_type: $return_type:literal,
        examples: [$($example:literal),*],
        implementation: $impl:expr
    ) => {
        $crate::register_function!(
            $registry,
            $name,
            category: $category,
            description: $desc,
            parameters: [$($param_name : $param_type => $param_desc),*],
            return_type: $return_type,
            examples: [$($example),*],
            pure: true,
            implementation: $impl
        )
    };

    (
        $registry:expr,
        $name:literal,
        category: $category:expr,
        description: $desc:literal,
        parameters: [$($param_name:literal : $param_type:literal => $param_desc:literal),*],
        return_type: $return_type:literal,
        examples: [$($example:literal),*],
        pure: $pure:expr,
        implementation: $impl:expr
    ) => {
        {
            let mut builder = $crate::registry::builder::FunctionBuilder::new($name, $category)
                .description($desc)
                .return_type($return_type);

            if !$pure {
                builder = builder.impure();
            }

            $(
                builder = builder.parameter($param_name, Some($param_type.to_string()), $param_desc);
            )*

            $(
                builder = builder.example($example);
            )*

            builder.register_sync($registry, std::sync::Arc::new($impl))
        }
    };
}
