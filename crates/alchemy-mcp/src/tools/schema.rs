//! Operation descriptors and table-driven argument validation
//!
//! Every tool is described by a `'static` [`OperationDescriptor`]. The same
//! table drives `tools/list` schemas and the structural checks run before any
//! backend call. Forwarding code only ever sees a [`ValidArgs`].

use serde_json::{json, Map, Value};

use crate::error::{DispatchError, Result};
use crate::protocol::{Tool, ToolAnnotations};

/// Declared shape of a single argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    String,
    /// Non-negative integer
    Integer,
    Number,
    Boolean,
    StringArray,
    Array,
    Object,
    /// Block tag or hex string, or a block number
    Block,
    /// String restricted to a fixed set
    OneOf(&'static [&'static str]),
}

impl FieldShape {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldShape::String => value.is_string(),
            FieldShape::Integer => value.is_u64(),
            FieldShape::Number => value.is_number(),
            FieldShape::Boolean => value.is_boolean(),
            FieldShape::StringArray => value
                .as_array()
                .map_or(false, |items| items.iter().all(Value::is_string)),
            FieldShape::Array => value.is_array(),
            FieldShape::Object => value.is_object(),
            FieldShape::Block => value.is_string() || value.is_u64(),
            FieldShape::OneOf(allowed) => value
                .as_str()
                .map_or(false, |s| allowed.contains(&s)),
        }
    }

    /// Human-readable expectation used in validation messages
    pub fn describe(&self) -> String {
        match self {
            FieldShape::String => "a string".to_string(),
            FieldShape::Integer => "a non-negative integer".to_string(),
            FieldShape::Number => "a number".to_string(),
            FieldShape::Boolean => "a boolean".to_string(),
            FieldShape::StringArray => "an array of strings".to_string(),
            FieldShape::Array => "an array".to_string(),
            FieldShape::Object => "an object".to_string(),
            FieldShape::Block => "a block tag, hex string or block number".to_string(),
            FieldShape::OneOf(allowed) => format!("one of: {}", allowed.join(", ")),
        }
    }

    pub fn json_schema(&self) -> Value {
        match self {
            FieldShape::String => json!({ "type": "string" }),
            FieldShape::Integer => json!({ "type": "integer", "minimum": 0 }),
            FieldShape::Number => json!({ "type": "number" }),
            FieldShape::Boolean => json!({ "type": "boolean" }),
            FieldShape::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            FieldShape::Array => json!({ "type": "array" }),
            FieldShape::Object => json!({ "type": "object" }),
            FieldShape::Block => json!({
                "oneOf": [
                    { "type": "string" },
                    { "type": "integer", "minimum": 0 }
                ]
            }),
            FieldShape::OneOf(allowed) => json!({ "type": "string", "enum": allowed }),
        }
    }
}

/// One declared argument of an operation
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: FieldShape,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(
        name: &'static str,
        shape: FieldShape,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            shape,
            required: true,
            description,
        }
    }

    pub const fn optional(
        name: &'static str,
        shape: FieldShape,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            shape,
            required: false,
            description,
        }
    }
}

/// Backend method group an operation forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationGroup {
    Nft,
    Core,
    Ens,
    Gas,
    Subscription,
}

impl OperationGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationGroup::Nft => "nft",
            OperationGroup::Core => "core",
            OperationGroup::Ens => "ens",
            OperationGroup::Gas => "gas",
            OperationGroup::Subscription => "subscription",
        }
    }
}

#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub group: OperationGroup,
    pub fields: &'static [FieldSpec],
    pub read_only: bool,
}

impl OperationDescriptor {
    /// Structural check of an argument bag against the declared fields.
    ///
    /// Absent or `null` arguments count as an empty object. Null values count
    /// as absent. Undeclared fields are ignored and not carried forward.
    pub fn validate(&self, arguments: &Value) -> Result<ValidArgs> {
        let empty = Map::new();
        let bag = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(DispatchError::InvalidParameters(format!(
                    "{}: arguments must be an object",
                    self.name
                )))
            }
        };

        let mut fields = Map::new();
        for spec in self.fields {
            match bag.get(spec.name).filter(|v| !v.is_null()) {
                None if spec.required => {
                    return Err(DispatchError::InvalidParameters(format!(
                        "{}: missing required field '{}' (expected {})",
                        self.name,
                        spec.name,
                        spec.shape.describe()
                    )));
                }
                None => {}
                Some(value) if !spec.shape.matches(value) => {
                    return Err(DispatchError::InvalidParameters(format!(
                        "{}: field '{}' must be {}",
                        self.name,
                        spec.name,
                        spec.shape.describe()
                    )));
                }
                Some(value) => {
                    fields.insert(spec.name.to_string(), value.clone());
                }
            }
        }

        Ok(ValidArgs {
            operation: self.name,
            fields,
        })
    }

    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for spec in self.fields {
            let mut schema = spec.shape.json_schema();
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("description".to_string(), json!(spec.description));
            }
            properties.insert(spec.name.to_string(), schema);
            if spec.required {
                required.push(spec.name);
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": true,
        })
    }

    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.to_string(),
            title: Some(self.title.to_string()),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
            annotations: Some(ToolAnnotations {
                read_only_hint: Some(self.read_only),
                destructive_hint: self.read_only.then_some(false),
                idempotent_hint: Some(self.read_only),
                open_world_hint: Some(true),
            }),
        }
    }
}

/// Arguments that passed validation for one operation
#[derive(Debug, Clone)]
pub struct ValidArgs {
    operation: &'static str,
    fields: Map<String, Value>,
}

impl ValidArgs {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    fn missing(&self, name: &str) -> DispatchError {
        DispatchError::InvalidParameters(format!(
            "{}: missing required field '{}'",
            self.operation, name
        ))
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(Value::as_str).map(str::to_string)
    }

    pub fn require_string(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| self.missing(name))
    }

    pub fn integer(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    pub fn strings(&self, name: &str) -> Option<Vec<String>> {
        self.fields.get(name).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    pub fn require_strings(&self, name: &str) -> Result<Vec<String>> {
        self.strings(name).ok_or_else(|| self.missing(name))
    }

    pub fn array(&self, name: &str) -> Option<Vec<Value>> {
        self.fields.get(name).and_then(Value::as_array).cloned()
    }

    /// Block reference as sent on the wire: numbers become `0x` hex
    pub fn block(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_u64().map(|n| format!("{:#x}", n)),
            _ => None,
        }
    }

    pub fn require_block(&self, name: &str) -> Result<String> {
        self.block(name).ok_or_else(|| self.missing(name))
    }
}
