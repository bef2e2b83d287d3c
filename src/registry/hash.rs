//! Digest and identifier functions
//!
//! Digests are computed over the UTF-8 bytes of the argument and returned as
//! lower-case hex. Identifier generators are impure.

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::Result;
use crate::register_function;
use hmac::{Hmac, Mac};
use md5::Md5;
use rand::Rng;
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

const SHORT_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_SHORT_ID_LENGTH: usize = 1024;

pub struct HashUtils;

impl HashUtils {
    pub fn digest<D: Digest>(input: &str) -> String {
        hex::encode(D::digest(input.as_bytes()))
    }

    /// Keyed digest; `None` for an unsupported algorithm
    pub fn hmac(algorithm: &str, key: &str, data: &str) -> Option<String> {
        macro_rules! keyed {
            ($digest:ty) => {{
                let mut mac = <Hmac<$digest> as Mac>::new_from_slice(key.as_bytes()).ok()?;
                mac.update(data.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }};
        }
        let signature = match algorithm.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => keyed!(Md5),
            "sha1" => keyed!(Sha1),
            "sha256" => keyed!(Sha256),
            "sha512" => keyed!(Sha512),
            _ => return None,
        };
        Some(signature)
    }

    pub fn short_id(length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| SHORT_ID_ALPHABET[rng.gen_range(0..SHORT_ID_ALPHABET.len())] as char)
            .collect()
    }
}

impl FunctionRegistry {
    pub fn register_hash_functions(&self) -> Result<()> {
        register_function!(
            self,
            "md5",
            category: FunctionCategory::Hash,
            description: "MD5 digest as hex",
            parameters: ["value": "string" => "Text to hash"],
            return_type: "string",
            examples: ["{{md5('hello')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(HashUtils::digest::<Md5>(&context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "sha1",
            category: FunctionCategory::Hash,
            description: "SHA-1 digest as hex",
            parameters: ["value": "string" => "Text to hash"],
            return_type: "string",
            examples: ["{{sha1('hello')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(HashUtils::digest::<Sha1>(&context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "sha256",
            category: FunctionCategory::Hash,
            description: "SHA-256 digest as hex",
            parameters: ["value": "string" => "Text to hash"],
            return_type: "string",
            examples: ["{{sha256(body)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(HashUtils::digest::<Sha256>(&context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "sha512",
            category: FunctionCategory::Hash,
            description: "SHA-512 digest as hex",
            parameters: ["value": "string" => "Text to hash"],
            return_type: "string",
            examples: ["{{sha512('hello')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(HashUtils::digest::<Sha512>(&context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "hmac",
            category: FunctionCategory::Hash,
            description: "HMAC signature as hex (md5, sha1, sha256 or sha512)",
            parameters: [
                "data": "string" => "Message",
                "key": "string" => "Secret key",
                "algorithm?": "string" => "Digest algorithm, defaults to sha256"
            ],
            return_type: "string",
            examples: ["{{hmac(body, env.SECRET)}}", "{{hmac('msg', 'key', 'sha1')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let data = context.string(0)?;
                let key = context.string(1)?;
                let algorithm = context.opt_string(2).unwrap_or_else(|| "sha256".to_string());
                HashUtils::hmac(&algorithm, &key, &data)
                    .map(|signature| Some(Value::String(signature)))
                    .ok_or_else(|| context.error(format!("unsupported algorithm '{algorithm}'")))
            }
        )
    }

    pub fn register_identifier_functions(&self) -> Result<()> {
        register_function!(
            self,
            "uuid",
            category: FunctionCategory::Identifier,
            description: "Random version 4 UUID",
            parameters: [],
            return_type: "string",
            examples: ["{{uuid()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(uuid::Uuid::new_v4().to_string())))
            }
        )?;

        register_function!(
            self,
            "guid",
            category: FunctionCategory::Identifier,
            description: "Random version 4 UUID (alias of uuid)",
            parameters: [],
            return_type: "string",
            examples: ["{{guid()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(uuid::Uuid::new_v4().to_string())))
            }
        )?;

        register_function!(
            self,
            "shortId",
            category: FunctionCategory::Identifier,
            description: "Random alphanumeric identifier (default length 8)",
            parameters: ["length?": "number" => "Identifier length"],
            return_type: "string",
            examples: ["{{shortId()}}", "{{shortId(12)}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let length = context.opt_count(0, 8, MAX_SHORT_ID_LENGTH)?;
                Ok(Some(Value::String(HashUtils::short_id(length))))
            }
        )
    }
}
