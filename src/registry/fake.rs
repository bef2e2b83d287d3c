//! Fake data generators (`faker.*`)
//!
//! Values are drawn from fixed word lists with the thread-local RNG. Every
//! generator is impure.

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::Result;
use crate::register_function;
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;

const MAX_LOREM_WORDS: usize = 10_000;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Taylor", "Moore", "Jackson",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "test.org", "mail.test", "demo.net"];

const STREET_NAMES: &[&str] = &[
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine St", "Elm St", "Washington Blvd",
    "Lake Rd", "Hill St", "Park Ave",
];

const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Franklin", "Greenville", "Bristol", "Clinton", "Fairview",
    "Salem", "Madison", "Georgetown",
];

const COMPANY_PREFIXES: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent",
    "Cyberdyne",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "Corp", "Labs", "Systems"];

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

pub struct FakeData;

impl FakeData {
    fn pick(words: &[&'static str]) -> &'static str {
        words.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
    }

    pub fn first_name() -> String {
        Self::pick(FIRST_NAMES).to_string()
    }

    pub fn last_name() -> String {
        Self::pick(LAST_NAMES).to_string()
    }

    pub fn name() -> String {
        format!("{} {}", Self::first_name(), Self::last_name())
    }

    pub fn email() -> String {
        let number: u16 = rand::thread_rng().gen_range(1..1000);
        format!(
            "{}.{}{}@{}",
            Self::first_name().to_lowercase(),
            Self::last_name().to_lowercase(),
            number,
            Self::pick(EMAIL_DOMAINS)
        )
    }

    pub fn phone() -> String {
        let mut rng = rand::thread_rng();
        format!(
            "+1-{:03}-{:03}-{:04}",
            rng.gen_range(200..1000),
            rng.gen_range(200..1000),
            rng.gen_range(0..10000)
        )
    }

    pub fn address() -> String {
        let house: u16 = rand::thread_rng().gen_range(1..10000);
        format!("{house} {}, {}", Self::pick(STREET_NAMES), Self::pick(CITIES))
    }

    pub fn company() -> String {
        format!("{} {}", Self::pick(COMPANY_PREFIXES), Self::pick(COMPANY_SUFFIXES))
    }

    pub fn lorem(words: usize) -> String {
        (0..words)
            .map(|_| Self::pick(LOREM_WORDS))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FunctionRegistry {
    pub fn register_fake_data_functions(&self) -> Result<()> {
        self.register_fake_person_functions()?;
        self.register_fake_contact_functions()?;
        self.register_fake_primitive_functions()?;
        Ok(())
    }

    fn register_fake_person_functions(&self) -> Result<()> {
        register_function!(
            self,
            "faker.name",
            category: FunctionCategory::FakeData,
            description: "Random full name",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.name()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::name())))
            }
        )?;

        register_function!(
            self,
            "faker.firstName",
            category: FunctionCategory::FakeData,
            description: "Random first name",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.firstName()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::first_name())))
            }
        )?;

        register_function!(
            self,
            "faker.lastName",
            category: FunctionCategory::FakeData,
            description: "Random last name",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.lastName()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::last_name())))
            }
        )?;

        register_function!(
            self,
            "faker.company",
            category: FunctionCategory::FakeData,
            description: "Random company name",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.company()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::company())))
            }
        )
    }

    fn register_fake_contact_functions(&self) -> Result<()> {
        register_function!(
            self,
            "faker.email",
            category: FunctionCategory::FakeData,
            description: "Random email address on a reserved test domain",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.email()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::email())))
            }
        )?;

        register_function!(
            self,
            "faker.phone",
            category: FunctionCategory::FakeData,
            description: "Random phone number",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.phone()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::phone())))
            }
        )?;

        register_function!(
            self,
            "faker.address",
            category: FunctionCategory::FakeData,
            description: "Random street address",
            parameters: [],
            return_type: "string",
            examples: ["{{faker.address()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(FakeData::address())))
            }
        )
    }

    fn register_fake_primitive_functions(&self) -> Result<()> {
        register_function!(
            self,
            "faker.lorem",
            category: FunctionCategory::FakeData,
            description: "Lorem ipsum text with the given number of words (default 5)",
            parameters: ["words?": "number" => "Word count"],
            return_type: "string",
            examples: ["{{faker.lorem()}}", "{{faker.lorem(12)}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let words = context.opt_count(0, 5, MAX_LOREM_WORDS)?;
                Ok(Some(Value::String(FakeData::lorem(words))))
            }
        )?;

        register_function!(
            self,
            "faker.number",
            category: FunctionCategory::FakeData,
            description: "Random integer between min and max inclusive (defaults 0 and 1000)",
            parameters: ["min?": "number" => "Lower bound", "max?": "number" => "Upper bound"],
            return_type: "number",
            examples: ["{{faker.number()}}", "{{faker.number(18, 65)}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let min = context.opt_number(0)?.unwrap_or(0.0).ceil() as i64;
                let max = context.opt_number(1)?.unwrap_or(1000.0).floor() as i64;
                if max < min {
                    return Err(context.error(format!("empty range {min}..={max}")));
                }
                Ok(Some(Value::from(rand::thread_rng().gen_range(min..=max))))
            }
        )?;

        register_function!(
            self,
            "faker.boolean",
            category: FunctionCategory::FakeData,
            description: "Random boolean",
            parameters: [],
            return_type: "boolean",
            examples: ["{{faker.boolean()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::Bool(rand::thread_rng().gen_bool(0.5))))
            }
        )
    }
}
