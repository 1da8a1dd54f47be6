//! Structured-output shapes: validate LLM JSON against a declared field shape.
//!
//! An [`ObjectShape`] is the single source of truth for a structured-output
//! contract: it renders the JSON-Schema document sent to the provider as a
//! `response_format` constraint, and it validates the text that comes back.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Expected type of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Any JSON number (integer or float).
    Number,
    /// A JSON number with no fractional part.
    Integer,
    String,
    Boolean,
    Object(ObjectShape),
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Object(_) => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Object(_) => value.is_object(),
        }
    }
}

/// One named field in an object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Declared shape of a JSON object.
///
/// With `strict` set, fields not listed in `fields` are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    pub fields: Vec<FieldSpec>,
    pub strict: bool,
}

/// Why a response failed structural validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected an object at `{path}`")]
    NotAnObject { path: String },

    #[error("missing required field `{path}`")]
    MissingField { path: String },

    #[error("field `{path}` should be {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected field `{path}`")]
    UnexpectedField { path: String },

    #[error("validated JSON did not deserialize: {0}")]
    Deserialize(String),
}

impl ObjectShape {
    /// An empty strict shape; add fields with [`ObjectShape::field`].
    pub fn strict() -> Self {
        Self {
            fields: Vec::new(),
            strict: true,
        }
    }

    /// An empty shape that tolerates unknown fields.
    pub fn lenient() -> Self {
        Self {
            fields: Vec::new(),
            strict: false,
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Parse `raw` as JSON and check it against this shape.
    pub fn validate(&self, raw: &str) -> Result<Value, SchemaViolation> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|e| SchemaViolation::InvalidJson(e.to_string()))?;
        self.check(&value, "")?;
        Ok(value)
    }

    /// Validate `raw` and deserialize it into `T`.
    pub fn parse<T: DeserializeOwned>(&self, raw: &str) -> Result<T, SchemaViolation> {
        let value = self.validate(raw)?;
        serde_json::from_value(value).map_err(|e| SchemaViolation::Deserialize(e.to_string()))
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let object = value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
            path: display_path(path),
        })?;

        for spec in &self.fields {
            let field_path = join_path(path, &spec.name);
            match object.get(&spec.name) {
                None if spec.required => {
                    return Err(SchemaViolation::MissingField { path: field_path });
                }
                None | Some(Value::Null) if !spec.required => {}
                None => {}
                Some(field) => {
                    if !spec.kind.matches(field) {
                        return Err(SchemaViolation::TypeMismatch {
                            path: field_path,
                            expected: spec.kind.name(),
                            found: json_type_name(field),
                        });
                    }
                    if let FieldKind::Object(inner) = &spec.kind {
                        inner.check(field, &field_path)?;
                    }
                }
            }
        }

        if self.strict {
            if let Some(extra) = object
                .keys()
                .find(|key| !self.fields.iter().any(|spec| &spec.name == *key))
            {
                return Err(SchemaViolation::UnexpectedField {
                    path: join_path(path, extra),
                });
            }
        }

        Ok(())
    }

    /// Render as a JSON-Schema object suitable for a `json_schema` response format.
    ///
    /// Strict structured output requires every property to be listed in
    /// `required`, so on strict shapes an optional field is rendered as
    /// required and nullable. Validation accepts `null` for optional fields.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in &self.fields {
            let mut property = match &spec.kind {
                FieldKind::Object(inner) => inner.to_json_schema(),
                other => json!({ "type": other.name() }),
            };
            if !spec.required && self.strict {
                property["type"] = json!([spec.kind.name(), "null"]);
            }
            properties.insert(spec.name.clone(), property);
            if spec.required || self.strict {
                required.push(Value::String(spec.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": !self.strict,
            "required": required,
        })
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
