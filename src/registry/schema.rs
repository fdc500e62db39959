//! Structural parameter schemas.
//!
//! A [`Schema`] lists the fields a tool accepts. It renders to JSON Schema for
//! discovery and validates raw call arguments, filling defaults for absent
//! optional fields.

use crate::error::{Result, YtError};
use serde_json::{json, Map, Value};

/// Primitive (or nested) type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object(Schema),
}

impl FieldType {
    pub fn json_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object(_) => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object(_) => value.is_object(),
        }
    }
}

/// One named field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl Field {
    /// A required field.
    pub fn required(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// An optional field without a default.
    pub fn optional(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type, description)
        }
    }

    /// Attach a default value, making the field optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }
}

/// Ordered set of fields describing an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut prop = match &field.field_type {
                FieldType::Object(inner) => inner.to_json_schema(),
                other => json!({ "type": other.json_name() }),
            };
            if let Value::Object(map) = &mut prop {
                map.insert("description".into(), Value::String(field.description.clone()));
                if let Some(default) = &field.default {
                    map.insert("default".into(), default.clone());
                }
            }
            properties.insert(field.name.clone(), prop);

            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate raw arguments, returning only declared fields with defaults applied.
    ///
    /// `None` and `null` are treated as an empty object. Fields are checked in
    /// declaration order and the first violation is reported.
    pub fn validate(&self, raw: Option<&Value>) -> Result<Map<String, Value>> {
        let empty = Map::new();
        let args = match raw {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(YtError::InvalidParameters(format!(
                    "arguments must be an object, got {}",
                    type_name(other)
                )))
            }
        };
        self.validate_object(args, "")
    }

    fn validate_object(&self, args: &Map<String, Value>, prefix: &str) -> Result<Map<String, Value>> {
        let mut validated = Map::new();

        for field in &self.fields {
            let path = format!("{}{}", prefix, field.name);

            match args.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(YtError::InvalidParameters(format!(
                            "'{}' is required and must be a {}",
                            path,
                            field.field_type.json_name()
                        )));
                    }
                    if let Some(default) = &field.default {
                        validated.insert(field.name.clone(), default.clone());
                    }
                }
                Some(value) if !field.field_type.matches(value) => {
                    return Err(YtError::InvalidParameters(format!(
                        "'{}' must be a {}, got {}",
                        path,
                        field.field_type.json_name(),
                        type_name(value)
                    )));
                }
                Some(value) => match (&field.field_type, value) {
                    (FieldType::Object(schema), Value::Object(inner)) => {
                        let nested = schema.validate_object(inner, &format!("{}.", path))?;
                        validated.insert(field.name.clone(), Value::Object(nested));
                    }
                    (_, Value::String(s)) if field.required && s.trim().is_empty() => {
                        return Err(YtError::InvalidParameters(format!(
                            "'{}' must not be empty",
                            path
                        )));
                    }
                    _ => {
                        validated.insert(field.name.clone(), value.clone());
                    }
                },
            }
        }

        Ok(validated)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
