//! Front matter schemas.
//!
//! A schema is a plain Rust struct deriving `Deserialize`, `Serialize` and
//! `JsonSchema`. [`Schema`] compiles the JSON Schema that `schemars`
//! generates for it once, then checks front matter mappings in two steps:
//!
//! 1. JSON Schema validation, which reports every violation at once.
//! 2. Deserialization into the struct, which applies `#[serde(default)]`
//!    values and catches constraints the JSON Schema cannot express
//!    (e.g. impossible calendar dates).
//!
//! Unknown keys are ignored, so several schemas can be checked against the
//! same front matter.
//!
//! Before step 1, numbers and booleans given for a field that only accepts
//! strings are turned into strings. YAML reads `date: 1998` as an integer;
//! a `String` field still gets `"1998"`.
//!
//! Two call paths share that construction:
//! - [`Schema::validate`] and [`Schema::validate_record`] log the failure
//!   (soft path).
//! - [`Schema::validate_front_matter_data`] returns the error (hard path).

use std::fmt;
use std::marker::PhantomData;

use jsonschema::Validator;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::front_matter::FrontMatter;

/// A validated record flattened back into a field -> value mapping.
pub type Record = Map<String, Value>;

/// Types usable as front matter schemas.
pub trait FrontMatterSchema: DeserializeOwned + Serialize + JsonSchema {}

impl<T> FrontMatterSchema for T where T: DeserializeOwned + Serialize + JsonSchema {}

/// Errors from schema construction and validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The generated JSON Schema could not be compiled.
    #[error("{schema}: generated JSON Schema does not compile: {message}")]
    Compile {
        /// Schema name.
        schema: String,
        /// Compiler error message.
        message: String,
    },

    /// The front matter violates the JSON Schema.
    #[error("{schema} validation failed: {}", errors.join("; "))]
    Invalid {
        /// Schema name.
        schema: String,
        /// One message per violation.
        errors: Vec<String>,
    },

    /// The front matter passed the JSON Schema but could not be deserialized.
    #[error("{schema} validation failed: {source}")]
    Deserialize {
        /// Schema name.
        schema: String,
        /// Deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A validated record could not be turned back into a mapping.
    #[error("{schema}: record does not serialize to a mapping")]
    NotAMapping {
        /// Schema name.
        schema: String,
    },
}

impl SchemaError {
    /// Human-readable messages, one per violation.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Invalid { errors, .. } => errors.clone(),
            Self::Deserialize { source, .. } => vec![source.to_string()],
            other => vec![other.to_string()],
        }
    }
}

/// A compiled front matter schema for `T`.
pub struct Schema<T> {
    name: String,
    document: Value,
    validator: Validator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl<T: FrontMatterSchema> Schema<T> {
    /// Generate and compile the JSON Schema for `T`.
    ///
    /// # Errors
    /// Returns [`SchemaError::Compile`] if the generated schema is not a
    /// valid JSON Schema.
    pub fn new() -> Result<Self, SchemaError> {
        let name = T::schema_name().into_owned();
        let document = serde_json::to_value(schemars::schema_for!(T)).map_err(|e| {
            SchemaError::Compile {
                schema: name.clone(),
                message: e.to_string(),
            }
        })?;
        let validator = jsonschema::validator_for(&document).map_err(|e| SchemaError::Compile {
            schema: name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            name,
            document,
            validator,
            _marker: PhantomData,
        })
    }

    /// The schema name (the Rust type name unless renamed).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The generated JSON Schema document.
    #[must_use]
    pub fn json_schema(&self) -> &Value {
        &self.document
    }

    /// Stringify scalars given for string-only properties, including the
    /// items of string arrays.
    fn coerce_scalars(&self, front_matter: &mut FrontMatter) {
        let Some(properties) = self.document.get("properties").and_then(Value::as_object) else {
            return;
        };
        for (key, value) in front_matter {
            let Some(property) = properties.get(key) else {
                continue;
            };
            match (value, property.get("items")) {
                (Value::Array(items), Some(item_schema)) => {
                    for item in items {
                        coerce_scalar(item, item_schema);
                    }
                }
                (value, _) => coerce_scalar(value, property),
            }
        }
    }

    fn construct(&self, front_matter: &FrontMatter) -> Result<T, SchemaError> {
        let mut front_matter = front_matter.clone();
        self.coerce_scalars(&mut front_matter);
        let instance = Value::Object(front_matter);

        let errors: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(SchemaError::Invalid {
                schema: self.name.clone(),
                errors,
            });
        }

        serde_json::from_value(instance).map_err(|source| SchemaError::Deserialize {
            schema: self.name.clone(),
            source,
        })
    }

    /// Build a `T` from front matter, propagating any failure.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if the front matter does not satisfy the schema.
    pub fn validate_front_matter_data(&self, front_matter: &FrontMatter) -> Result<T, SchemaError> {
        self.construct(front_matter)
    }

    /// Log a failed construction and reduce it to its messages.
    fn soft<R>(&self, result: Result<R, SchemaError>) -> Result<R, Vec<String>> {
        result.map_err(|e| {
            tracing::warn!(schema = %self.name, "Validation error: {e}");
            e.messages()
        })
    }

    /// Build a `T` from front matter, logging and swallowing any failure.
    #[must_use]
    pub fn validate(&self, front_matter: &FrontMatter) -> Option<T> {
        self.soft(self.construct(front_matter)).ok()
    }

    /// Flatten a validated value into a field -> value mapping.
    ///
    /// The mapping uses the schema's serialized field names and includes
    /// defaulted fields.
    ///
    /// # Errors
    /// Returns [`SchemaError::NotAMapping`] if `T` does not serialize to an
    /// object.
    pub fn to_record(&self, value: &T) -> Result<Record, SchemaError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(record)) => Ok(record),
            _ => Err(SchemaError::NotAMapping {
                schema: self.name.clone(),
            }),
        }
    }

    /// Soft-path validation that returns the flattened record.
    ///
    /// # Errors
    /// A failure is logged, then handed back as one message per violation.
    pub fn validate_record(&self, front_matter: &FrontMatter) -> Result<Record, Vec<String>> {
        let record = self
            .construct(front_matter)
            .and_then(|value| self.to_record(&value));
        self.soft(record)
    }
}

/// Whether a property schema accepts JSON values of type `name`.
fn admits(property: &Value, name: &str) -> bool {
    match property.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t == name),
        _ => property
            .get("anyOf")
            .and_then(Value::as_array)
            .is_some_and(|variants| variants.iter().any(|v| admits(v, name))),
    }
}

fn coerce_scalar(value: &mut Value, property: &Value) {
    let own_type_admitted = match value {
        Value::Number(_) => admits(property, "number") || admits(property, "integer"),
        Value::Bool(_) => admits(property, "boolean"),
        _ => return,
    };
    if !own_type_admitted && admits(property, "string") {
        *value = Value::String(value.to_string());
    }
}
