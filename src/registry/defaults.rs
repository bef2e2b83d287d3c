//! Default function set for placeholder expressions

use super::FunctionRegistry;
use crate::core::Result;

impl FunctionRegistry {
    pub fn register_default_functions(&self) -> Result<()> {
        // Register string functions
        self.register_string_functions()?;

        // Register math functions
        self.register_math_functions()?;

        // Register datetime functions
        self.register_datetime_functions()?;

        // Register encoding and hashing functions
        self.register_encoding_functions()?;
        self.register_hash_functions()?;
        self.register_identifier_functions()?;

        // Register array and object functions
        self.register_collection_functions()?;
        self.register_object_functions()?;

        // Register conditional and type functions
        self.register_conditional_functions()?;
        self.register_type_functions()?;

        // faker.* generators
        self.register_fake_data_functions()?;

        Ok(())
    }
}
