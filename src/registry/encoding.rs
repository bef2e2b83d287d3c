//! Encoding functions: base64, URL, HTML entities and JSON text

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::Result;
use crate::register_function;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::Value;

/// Characters left unescaped by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub struct EncodingUtils;

impl EncodingUtils {
    pub fn url_encode(input: &str) -> String {
        utf8_percent_encode(input, URI_COMPONENT).to_string()
    }

    pub fn url_decode(input: &str) -> Option<String> {
        percent_decode_str(input)
            .decode_utf8()
            .ok()
            .map(|decoded| decoded.into_owned())
    }
}

impl FunctionRegistry {
    pub fn register_encoding_functions(&self) -> Result<()> {
        self.register_base64_functions()?;
        self.register_url_functions()?;
        self.register_html_functions()?;
        self.register_json_functions()?;
        Ok(())
    }

    fn register_base64_functions(&self) -> Result<()> {
        register_function!(
            self,
            "base64",
            category: FunctionCategory::Encoding,
            description: "Base64-encodes the UTF-8 bytes of the value",
            parameters: ["value": "string" => "Text to encode"],
            return_type: "string",
            examples: ["{{base64('user:pass')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(STANDARD.encode(context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "base64Decode",
            category: FunctionCategory::Encoding,
            description: "Decodes base64 text into a UTF-8 string",
            parameters: ["value": "string" => "Base64 text"],
            return_type: "string",
            examples: ["{{base64Decode('aGVsbG8=')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let bytes = STANDARD
                    .decode(context.string(0)?.trim())
                    .map_err(|e| context.error(format!("invalid base64: {e}")))?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| context.error("decoded bytes are not valid UTF-8"))?;
                Ok(Some(Value::String(text)))
            }
        )
    }

    fn register_url_functions(&self) -> Result<()> {
        register_function!(
            self,
            "urlEncode",
            category: FunctionCategory::Encoding,
            description: "Percent-encodes text for use in a URL component",
            parameters: ["value": "string" => "Text to encode"],
            return_type: "string",
            examples: ["{{urlEncode('a b&c')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(EncodingUtils::url_encode(&context.string(0)?))))
            }
        )?;

        register_function!(
            self,
            "urlDecode",
            category: FunctionCategory::Encoding,
            description: "Decodes percent-encoded text",
            parameters: ["value": "string" => "Encoded text"],
            return_type: "string",
            examples: ["{{urlDecode('a%20b')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let decoded = EncodingUtils::url_decode(&context.string(0)?)
                    .ok_or_else(|| context.error("decoded bytes are not valid UTF-8"))?;
                Ok(Some(Value::String(decoded)))
            }
        )
    }

    fn register_html_functions(&self) -> Result<()> {
        register_function!(
            self,
            "htmlEncode",
            category: FunctionCategory::Encoding,
            description: "Escapes HTML special characters",
            parameters: ["value": "string" => "Text to escape"],
            return_type: "string",
            examples: ["{{htmlEncode('<b>')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let text = context.string(0)?;
                Ok(Some(Value::String(
                    html_escape::encode_double_quoted_attribute(&text)
                        .replace('\'', "&#x27;"),
                )))
            }
        )?;

        register_function!(
            self,
            "htmlDecode",
            category: FunctionCategory::Encoding,
            description: "Unescapes HTML entities",
            parameters: ["value": "string" => "Escaped text"],
            return_type: "string",
            examples: ["{{htmlDecode('&lt;b&gt;')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let text = context.string(0)?;
                Ok(Some(Value::String(
                    html_escape::decode_html_entities(&text).into_owned(),
                )))
            }
        )
    }

    fn register_json_functions(&self) -> Result<()> {
        register_function!(
            self,
            "jsonEncode",
            category: FunctionCategory::Encoding,
            description: "Serializes a value to compact JSON text",
            parameters: ["value": "any" => "Value to serialize"],
            return_type: "string",
            examples: ["{{jsonEncode(user)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let text = serde_json::to_string(context.require(0)?)
                    .map_err(|e| context.error(e.to_string()))?;
                Ok(Some(Value::String(text)))
            }
        )?;

        register_function!(
            self,
            "jsonDecode",
            category: FunctionCategory::Encoding,
            description: "Parses JSON text into a value",
            parameters: ["value": "string" => "JSON text"],
            return_type: "any",
            examples: ["{{jsonDecode('{\"a\":1}')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let value = match context.require(0)? {
                    Value::String(text) => serde_json::from_str(text)
                        .map_err(|e| context.error(format!("invalid JSON: {e}")))?,
                    other => other.clone(),
                };
                Ok(Some(value))
            }
        )
    }
}
