//! Declarative parameter schemas.
//!
//! Every tool declares its parameters as an ordered list of [`FieldSpec`]s.
//! Raw arguments are checked against that list before the handler runs, so
//! a bad argument never reaches the network. The same list renders the JSON
//! Schema advertised in `tools/list`.

use serde_json::{Map, Value, json};
use tracing::debug;

use super::error::{ToolError, ToolResult};

/// Primitive shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// JSON integers only; strings and floats are rejected.
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Object whose values are all strings (labels, build parameters).
    StringMap,
}

impl FieldType {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object | Self::StringMap => "object",
            Self::Array => "array",
        }
    }

    /// Shape check used for array items.
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Object => "an object",
            Self::Array => "an array",
            Self::StringMap => "an object of strings",
        }
    }
}

/// One named parameter and its validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub non_empty: bool,
    pub default: Option<Value>,
    pub allowed: Option<&'static [&'static str]>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Element type of an [`FieldType::Array`] field; unchecked when `None`.
    pub items: Option<FieldType>,
}

impl FieldSpec {
    fn new(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            description,
            field_type,
            required: false,
            non_empty: false,
            default: None,
            allowed: None,
            min: None,
            max: None,
            items: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::Integer, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::Number, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::Boolean, description)
    }

    pub fn object(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::Object, description)
    }

    pub fn array(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::Array, description)
    }

    /// Array whose elements must all be strings (tags, labels, usernames).
    pub fn string_array(name: &'static str, description: &'static str) -> Self {
        Self::array(name, description).items(FieldType::String)
    }

    pub fn string_map(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldType::StringMap, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Required and must contain at least one non-whitespace character.
    pub fn non_empty(mut self) -> Self {
        self.required = true;
        self.non_empty = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn items(mut self, item_type: FieldType) -> Self {
        self.items = Some(item_type);
        self
    }

    pub fn range(self, min: i64, max: i64) -> Self {
        self.min(min).max(max)
    }

    fn check(&self, value: &Value) -> ToolResult<()> {
        let fail = |reason: String| Err(ToolError::validation(self.name, reason));

        match self.field_type {
            FieldType::String => {
                let Some(s) = value.as_str() else {
                    return fail(format!("expected a string, got {}", type_name(value)));
                };
                if self.non_empty && s.trim().is_empty() {
                    return fail("must not be empty".to_string());
                }
                if let Some(allowed) = self.allowed {
                    if !allowed.contains(&s) {
                        return fail(format!(
                            "'{s}' is not one of: {}",
                            allowed.join(", ")
                        ));
                    }
                }
            }
            FieldType::Integer => {
                let Some(n) = value.as_i64() else {
                    return fail(format!("expected an integer, got {}", type_name(value)));
                };
                self.check_bounds(n as f64)?;
            }
            FieldType::Number => {
                let Some(n) = value.as_f64() else {
                    return fail(format!("expected a number, got {}", type_name(value)));
                };
                self.check_bounds(n)?;
            }
            FieldType::Boolean => {
                if !value.is_boolean() {
                    return fail(format!("expected a boolean, got {}", type_name(value)));
                }
            }
            FieldType::Object => {
                if !value.is_object() {
                    return fail(format!("expected an object, got {}", type_name(value)));
                }
            }
            FieldType::Array => {
                let Some(items) = value.as_array() else {
                    return fail(format!("expected an array, got {}", type_name(value)));
                };
                if self.non_empty && items.is_empty() {
                    return fail("must not be empty".to_string());
                }
                if let Some(item_type) = self.items {
                    let bad = items.iter().enumerate().find(|(_, v)| !item_type.accepts(v));
                    if let Some((i, item)) = bad {
                        return fail(format!(
                            "item {i}: expected {}, got {}",
                            item_type.expected(),
                            type_name(item)
                        ));
                    }
                }
            }
            FieldType::StringMap => {
                let Some(map) = value.as_object() else {
                    return fail(format!("expected an object, got {}", type_name(value)));
                };
                if let Some((key, _)) = map.iter().find(|(_, v)| !v.is_string()) {
                    return fail(format!("value for '{key}' must be a string"));
                }
            }
        }
        Ok(())
    }

    fn check_bounds(&self, n: f64) -> ToolResult<()> {
        if let Some(min) = self.min {
            if n < min as f64 {
                return Err(ToolError::validation(
                    self.name,
                    format!("must be >= {min}, got {n}"),
                ));
            }
        }
        if let Some(max) = self.max {
            if n > max as f64 {
                return Err(ToolError::validation(
                    self.name,
                    format!("must be <= {max}, got {n}"),
                ));
            }
        }
        Ok(())
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.field_type.json_type()));
        if !self.description.is_empty() {
            prop.insert("description".into(), json!(self.description));
        }
        if self.field_type == FieldType::StringMap {
            prop.insert("additionalProperties".into(), json!({"type": "string"}));
        }
        if let Some(item_type) = self.items {
            prop.insert("items".into(), json!({"type": item_type.json_type()}));
        }
        if let Some(allowed) = self.allowed {
            prop.insert("enum".into(), json!(allowed));
        }
        if let Some(min) = self.min {
            prop.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.max {
            prop.insert("maximum".into(), json!(max));
        }
        if self.non_empty {
            let key = if self.field_type == FieldType::Array { "minItems" } else { "minLength" };
            prop.insert(key.into(), json!(1));
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered parameter list of one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `raw` and return the validated parameters with defaults applied.
    ///
    /// `null` is accepted as "no arguments". An explicit `null` for a field
    /// counts as absent. Undeclared keys are ignored.
    pub fn validate(&self, raw: Value) -> ToolResult<Params> {
        let mut input = match raw {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ToolError::validation(
                    "arguments",
                    format!("expected an object, got {}", type_name(&other)),
                ));
            }
        };

        let mut values = Map::new();
        for field in &self.fields {
            match input.remove(field.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    field.check(&value)?;
                    values.insert(field.name.to_string(), value);
                }
                None if field.required => {
                    return Err(ToolError::validation(field.name, "is required"));
                }
                None => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        if !input.is_empty() {
            let ignored: Vec<&str> = input.keys().map(String::as_str).collect();
            debug!(?ignored, "Ignoring undeclared parameters");
        }

        Ok(Params { values })
    }

    /// JSON Schema object advertised to clients.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }
}

/// Validated parameters, defaults already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// A string the schema marks as required.
    pub fn require_str(&self, name: &str) -> ToolResult<&str> {
        self.str(name)
            .ok_or_else(|| ToolError::validation(name, "is required"))
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    /// Elements of a string array field, in order.
    pub fn strings(&self, name: &str) -> Vec<&str> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Entries of a [`FieldType::StringMap`] field, in key order.
    pub fn string_map(&self, name: &str) -> Vec<(String, String)> {
        self.values
            .get(name)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: &[&str] = &["open", "closed", "all"];

    fn schema() -> ParamSchema {
        ParamSchema::new(vec![
            FieldSpec::string("name", "Item name").non_empty(),
            FieldSpec::string("state", "Filter").one_of(STATES).default("open"),
            FieldSpec::integer("per_page", "Page size").range(1, 100).default(30),
            FieldSpec::boolean("private", "Private flag"),
            FieldSpec::string_map("labels", "Labels"),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let params = schema().validate(json!({"name": "svc"})).unwrap();
        assert_eq!(params.str("state"), Some("open"));
        assert_eq!(params.i64("per_page"), Some(30));
        assert_eq!(params.bool("private"), None);
    }

    #[test]
    fn test_missing_required_names_field() {
        let err = schema().validate(json!({})).unwrap_err();
        assert_eq!(err, ToolError::validation("name", "is required"));

        let err = schema().validate(Value::Null).unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_empty_string_rejected() {
        let err = schema().validate(json!({"name": "  "})).unwrap_err();
        assert_eq!(err, ToolError::validation("name", "must not be empty"));
    }

    #[test]
    fn test_enum_checked() {
        let err = schema()
            .validate(json!({"name": "x", "state": "merged"}))
            .unwrap_err();
        assert_eq!(err.field(), Some("state"));
        assert!(err.message().contains("open, closed, all"));
    }

    #[test]
    fn test_integer_bounds_and_strictness() {
        let err = schema()
            .validate(json!({"name": "x", "per_page": 101}))
            .unwrap_err();
        assert_eq!(err.field(), Some("per_page"));

        let err = schema()
            .validate(json!({"name": "x", "per_page": "10"}))
            .unwrap_err();
        assert_eq!(err.message(), "expected an integer, got string");

        let err = schema()
            .validate(json!({"name": "x", "per_page": 2.5}))
            .unwrap_err();
        assert_eq!(err.message(), "expected an integer, got number");
    }

    #[test]
    fn test_null_treated_as_absent_and_extras_ignored() {
        let params = schema()
            .validate(json!({"name": "x", "state": null, "unknown": 1}))
            .unwrap();
        assert_eq!(params.str("state"), Some("open"));
        assert!(params.get("unknown").is_none());
    }

    #[test]
    fn test_string_map() {
        let params = schema()
            .validate(json!({"name": "x", "labels": {"b": "2", "a": "1"}}))
            .unwrap();
        assert_eq!(
            params.string_map("labels"),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );

        let err = schema()
            .validate(json!({"name": "x", "labels": {"a": 1}}))
            .unwrap_err();
        assert_eq!(err.field(), Some("labels"));
    }

    #[test]
    fn test_string_array_items_checked() {
        let schema = ParamSchema::new(vec![FieldSpec::string_array("tags", "Tags")]);
        let params = schema.validate(json!({"tags": ["env:prod", "team:ops"]})).unwrap();
        assert_eq!(params.strings("tags"), vec!["env:prod", "team:ops"]);

        let err = schema.validate(json!({"tags": ["env:prod", 2]})).unwrap_err();
        assert_eq!(err, ToolError::validation("tags", "item 1: expected a string, got integer"));

        let rendered = Value::Object(schema.to_json_schema());
        assert_eq!(rendered["properties"]["tags"]["items"], json!({"type": "string"}));
    }

    #[test]
    fn test_untyped_array_accepts_mixed_items() {
        let schema = ParamSchema::new(vec![FieldSpec::array("sort", "Sort")]);
        assert!(schema.validate(json!({"sort": ["ts", {"id": "asc"}]})).is_ok());
        let rendered = Value::Object(schema.to_json_schema());
        assert!(rendered["properties"]["sort"].get("items").is_none());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = schema().validate(json!([1, 2])).unwrap_err();
        assert_eq!(err.field(), Some("arguments"));
    }

    #[test]
    fn test_json_schema_rendering() {
        let rendered = Value::Object(schema().to_json_schema());
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["name"]));
        assert_eq!(rendered["properties"]["name"]["minLength"], 1);
        assert_eq!(rendered["properties"]["state"]["enum"], json!(["open", "closed", "all"]));
        assert_eq!(rendered["properties"]["per_page"]["minimum"], 1);
        assert_eq!(rendered["properties"]["per_page"]["maximum"], 100);
        assert_eq!(rendered["properties"]["per_page"]["default"], 30);
        assert_eq!(
            rendered["properties"]["labels"]["additionalProperties"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn test_empty_schema() {
        let rendered = Value::Object(ParamSchema::empty().to_json_schema());
        assert_eq!(rendered, json!({"type": "object", "properties": {}}));
        assert!(ParamSchema::empty().validate(json!({"x": 1})).is_ok());
    }
}
