//! Request argument schema, validation, and coercion
//!
//! A [`ParserSchema`] declares the arguments an endpoint accepts: name,
//! location, expected type, required flag, and allowed choices. Schemas are
//! built once (usually as statics) and are immutable afterwards; parsing a
//! request produces a request-scoped [`ParsedArgs`] snapshot, never touching
//! the schema.
//!
//! Validation is batched. Every violation found while parsing one request
//! (missing required value, bad choice, failed coercion) is collected, and
//! the request fails with the full ordered message list rather than the
//! first problem encountered.

use axum::{
    extract::{FromRequest, Query, Request},
    http::{header::CONTENT_TYPE, Method},
    Form, Json,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Where an argument is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSource {
    /// URL query string
    Query,
    /// Form-encoded request body
    Form,
    /// JSON object request body
    Json,
}

impl ArgSource {
    fn is_body(self) -> bool {
        matches!(self, ArgSource::Form | ArgSource::Json)
    }
}

impl fmt::Display for ArgSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSource::Query => write!(f, "query"),
            ArgSource::Form => write!(f, "form"),
            ArgSource::Json => write!(f, "json"),
        }
    }
}

/// Target type an argument's raw string is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgKind {
    /// Keep the raw string
    #[default]
    Str,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Boolean (`true`/`false`/`1`/`0`, case-insensitive)
    Bool,
    /// All occurrences of the key, in request order
    List,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Str => write!(f, "string"),
            ArgKind::Int => write!(f, "integer"),
            ArgKind::Float => write!(f, "float"),
            ArgKind::Bool => write!(f, "boolean"),
            ArgKind::List => write!(f, "list"),
        }
    }
}

/// A successfully coerced argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl ArgKind {
    fn coerce(self, raw: &str) -> Option<ArgValue> {
        match self {
            ArgKind::Str => Some(ArgValue::Str(raw.to_string())),
            ArgKind::Int => raw.trim().parse::<i64>().ok().map(ArgValue::Int),
            ArgKind::Float => raw.trim().parse::<f64>().ok().map(ArgValue::Float),
            ArgKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(ArgValue::Bool(true)),
                "false" | "0" => Some(ArgValue::Bool(false)),
                _ => None,
            },
            // handled separately in parse, a single raw still coerces
            ArgKind::List => Some(ArgValue::List(vec![raw.to_string()])),
        }
    }
}

/// One expected request parameter
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    source: Option<ArgSource>,
    kind: ArgKind,
    required: bool,
    choices: Option<Vec<String>>,
}

impl Argument {
    /// Optional string argument with the location resolved from the request
    /// method at parse time (GET reads the query string, everything else the
    /// body)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            kind: ArgKind::default(),
            required: false,
            choices: None,
        }
    }

    /// Pin the argument to a location
    #[must_use]
    pub fn with_source(mut self, source: ArgSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the coercion target type
    #[must_use]
    pub fn with_kind(mut self, kind: ArgKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the argument required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict accepted raw values to a fixed set, checked before coercion
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn resolved_source(&self, method: &Method) -> ArgSource {
        self.source.unwrap_or(if *method == Method::GET {
            ArgSource::Query
        } else {
            ArgSource::Form
        })
    }
}

/// Builder for [`ParserSchema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    args: Vec<Argument>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn arg(mut self, argument: Argument) -> Self {
        self.args.push(argument);
        self
    }

    /// Finalize the schema, rejecting duplicate argument names
    pub fn build(self) -> Result<ParserSchema> {
        for (i, arg) in self.args.iter().enumerate() {
            if self.args[..i].iter().any(|a| a.name == arg.name) {
                return Err(Error::bad_args(format!(
                    "duplicate argument '{}' in schema",
                    arg.name
                )));
            }
        }
        Ok(ParserSchema { args: self.args })
    }
}

/// Parse-time modifiers, defaulting to "all arguments, required enforced"
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions<'a> {
    /// Restrict parsing to this subset of argument names
    pub include_only: Option<&'a [&'a str]>,
    /// Treat every argument as optional for this parse
    pub ignore_required: bool,
}

/// Immutable ordered argument schema
#[derive(Debug, Clone)]
pub struct ParserSchema {
    args: Vec<Argument>,
}

impl ParserSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parse with default options
    pub fn parse(&self, input: &RequestInput) -> Result<ParsedArgs> {
        self.parse_with(input, ParseOptions::default())
    }

    /// Validate and coerce the request against the schema.
    ///
    /// Collects every violation before failing; a request with three
    /// problems reports all three.
    pub fn parse_with(&self, input: &RequestInput, options: ParseOptions<'_>) -> Result<ParsedArgs> {
        let active: Vec<&Argument> = self
            .args
            .iter()
            .filter(|a| match options.include_only {
                Some(names) => names.contains(&a.name.as_str()),
                None => true,
            })
            .collect();

        // A body-located argument with no body at all is a malformed
        // request, reported before per-argument validation.
        if input.body.is_none()
            && active
                .iter()
                .any(|a| a.resolved_source(&input.method).is_body())
        {
            return Err(Error::bad_args(
                "form or json data is missing from the request",
            ));
        }

        let mut errors = Vec::new();
        let mut values = BTreeMap::new();

        for arg in active {
            let source = arg.resolved_source(&input.method);
            let raws = input.lookup(source, &arg.name);

            if raws.is_empty() {
                if arg.required && !options.ignore_required {
                    errors.push(format!("missing required argument: {}", arg.name));
                } else {
                    values.insert(arg.name.clone(), None);
                }
                continue;
            }

            if let Some(choices) = &arg.choices {
                if let Some(bad) = raws.iter().find(|raw| !choices.contains(raw)) {
                    errors.push(format!(
                        "bad choice '{}' for argument '{}', available choices: {}",
                        bad,
                        arg.name,
                        choices.join(", ")
                    ));
                    continue;
                }
            }

            let coerced = if arg.kind == ArgKind::List {
                Some(ArgValue::List(raws.clone()))
            } else {
                arg.kind.coerce(&raws[0])
            };

            match coerced {
                Some(value) => {
                    values.insert(arg.name.clone(), Some(value));
                }
                None => errors.push(format!(
                    "argument '{}' expected {}, got '{}'",
                    arg.name, arg.kind, raws[0]
                )),
            }
        }

        if errors.is_empty() {
            Ok(ParsedArgs { values })
        } else {
            Err(Error::BadArgs(errors))
        }
    }
}

/// Immutable per-request snapshot of coerced argument values
///
/// Only exists after a successful parse; absent optional arguments are
/// present as `None`.
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    values: BTreeMap<String, Option<ArgValue>>,
}

impl ParsedArgs {
    /// Raw lookup; outer `None` means the name was not part of the parse
    pub fn get(&self, name: &str) -> Option<&Option<ArgValue>> {
        self.values.get(name)
    }

    /// String value if present and of string kind
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_ref()?.as_str()
    }

    /// Integer value if present and of integer kind
    pub fn opt_int(&self, name: &str) -> Option<i64> {
        self.values.get(name)?.as_ref()?.as_int()
    }

    /// String value that the schema guarantees present (required + parsed)
    pub fn string(&self, name: &str) -> Result<&str> {
        self.opt_str(name)
            .ok_or_else(|| Error::Internal(format!("argument '{name}' missing after parse")))
    }

    /// Integer value that the schema guarantees present
    pub fn integer(&self, name: &str) -> Result<i64> {
        self.opt_int(name)
            .ok_or_else(|| Error::Internal(format!("argument '{name}' missing after parse")))
    }

    /// True iff every named argument parsed to a non-null value
    pub fn has_all(&self, names: &[&str]) -> bool {
        names
            .iter()
            .all(|name| matches!(self.values.get(*name), Some(Some(_))))
    }
}

/// Normalized view of one HTTP request
///
/// Query pairs come from the URL; the body, when present, is normalized to
/// ordered key/value pairs whether it arrived form-encoded or as a JSON
/// object. Handlers take this as an extractor (it consumes the body, so it
/// must be the last extractor argument).
#[derive(Debug, Clone)]
pub struct RequestInput {
    method: Method,
    query: Vec<(String, String)>,
    body: Option<Vec<(String, String)>>,
}

impl RequestInput {
    /// Assemble an input directly, mainly for tests
    pub fn new(
        method: Method,
        query: Vec<(String, String)>,
        body: Option<Vec<(String, String)>>,
    ) -> Self {
        Self {
            method,
            query,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    fn lookup(&self, source: ArgSource, name: &str) -> Vec<String> {
        let pairs: &[(String, String)] = match source {
            ArgSource::Query => &self.query,
            ArgSource::Form | ArgSource::Json => match &self.body {
                Some(pairs) => pairs,
                None => return Vec::new(),
            },
        };
        pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// Flatten a JSON object into ordered key/value string pairs.
///
/// Scalars stringify; array elements flatten to repeated keys (for `List`
/// arguments); nulls and nested objects are skipped.
fn flatten_json_object(object: serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in object {
        match value {
            Value::String(s) => pairs.push((key, s)),
            Value::Number(n) => pairs.push((key, n.to_string())),
            Value::Bool(b) => pairs.push((key, b.to_string())),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(s) => pairs.push((key.clone(), s)),
                        Value::Number(n) => pairs.push((key.clone(), n.to_string())),
                        Value::Bool(b) => pairs.push((key.clone(), b.to_string())),
                        _ => {}
                    }
                }
            }
            Value::Null | Value::Object(_) => {}
        }
    }
    pairs
}

impl<S> FromRequest<S> for RequestInput
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let method = req.method().clone();

        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|e| Error::bad_args(format!("malformed query string: {e}")))?;

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| Error::bad_args(format!("malformed json body: {e}")))?;
            match value {
                Value::Object(object) => Some(flatten_json_object(object)),
                _ => {
                    return Err(Error::bad_args("json body must be an object"));
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| Error::bad_args(format!("malformed form body: {e}")))?;
            Some(pairs)
        } else {
            None
        };

        Ok(Self {
            method,
            query,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParserSchema {
        ParserSchema::builder()
            .arg(Argument::new("name").required())
            .arg(Argument::new("age").with_kind(ArgKind::Int).required())
            .arg(
                Argument::new("breed")
                    .required()
                    .with_choices(["siamese", "maine_coon"]),
            )
            .arg(Argument::new("tags").with_kind(ArgKind::List))
            .build()
            .unwrap()
    }

    fn post_body(pairs: &[(&str, &str)]) -> RequestInput {
        RequestInput::new(
            Method::POST,
            vec![],
            Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        )
    }

    #[test]
    fn test_well_formed_parse_coerces_types() {
        let args = schema()
            .parse(&post_body(&[
                ("name", "Whiskers"),
                ("age", "3"),
                ("breed", "siamese"),
            ]))
            .unwrap();

        assert_eq!(args.opt_str("name"), Some("Whiskers"));
        assert_eq!(args.opt_int("age"), Some(3));
        assert_eq!(args.opt_str("breed"), Some("siamese"));
        // optional and absent: present as null
        assert_eq!(args.get("tags"), Some(&None));
    }

    #[test]
    fn test_all_violations_batched() {
        let err = schema()
            .parse(&post_body(&[("age", "young"), ("breed", "dragon")]))
            .unwrap_err();

        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().any(|m| m.contains("name")));
        assert!(messages.iter().any(|m| m.contains("young")));
        assert!(messages.iter().any(|m| m.contains("dragon")));
    }

    #[test]
    fn test_missing_required_names_argument() {
        let err = schema().parse(&post_body(&[])).unwrap_err();
        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert!(messages.contains(&"missing required argument: name".to_string()));
    }

    #[test]
    fn test_bad_choice_lists_available() {
        let err = schema()
            .parse(&post_body(&[
                ("name", "Whiskers"),
                ("age", "3"),
                ("breed", "dragon"),
            ]))
            .unwrap_err();
        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert_eq!(
            messages[0],
            "bad choice 'dragon' for argument 'breed', available choices: siamese, maine_coon"
        );
    }

    #[test]
    fn test_include_only_narrows_active_set() {
        let input = post_body(&[("name", "Whiskers")]);
        let args = schema()
            .parse_with(
                &input,
                ParseOptions {
                    include_only: Some(&["name"]),
                    ignore_required: false,
                },
            )
            .unwrap();
        assert_eq!(args.opt_str("name"), Some("Whiskers"));
        // not part of the parse at all
        assert!(args.get("age").is_none());
    }

    #[test]
    fn test_ignore_required_stores_null() {
        let args = schema()
            .parse_with(
                &post_body(&[("name", "Whiskers")]),
                ParseOptions {
                    include_only: None,
                    ignore_required: true,
                },
            )
            .unwrap();
        assert_eq!(args.opt_str("name"), Some("Whiskers"));
        assert_eq!(args.get("age"), Some(&None));
    }

    #[test]
    fn test_has_all_requires_non_null_values() {
        let args = schema()
            .parse_with(
                &post_body(&[("name", "Whiskers")]),
                ParseOptions {
                    include_only: None,
                    ignore_required: true,
                },
            )
            .unwrap();
        assert!(args.has_all(&["name"]));
        assert!(!args.has_all(&["name", "age"]));
        assert!(!args.has_all(&["unknown"]));
    }

    #[test]
    fn test_missing_body_for_body_arguments() {
        let input = RequestInput::new(Method::POST, vec![], None);
        let err = schema().parse(&input).unwrap_err();
        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert_eq!(messages, ["form or json data is missing from the request"]);
    }

    #[test]
    fn test_get_reads_query_by_default() {
        let schema = ParserSchema::builder()
            .arg(Argument::new("page").with_kind(ArgKind::Int))
            .build()
            .unwrap();
        let input = RequestInput::new(
            Method::GET,
            vec![("page".to_string(), "2".to_string())],
            None,
        );
        let args = schema.parse(&input).unwrap();
        assert_eq!(args.opt_int("page"), Some(2));
    }

    #[test]
    fn test_empty_query_is_present_not_missing() {
        let schema = ParserSchema::builder()
            .arg(Argument::new("page").with_kind(ArgKind::Int))
            .build()
            .unwrap();
        let input = RequestInput::new(Method::GET, vec![], None);
        let args = schema.parse(&input).unwrap();
        assert_eq!(args.get("page"), Some(&None));
    }

    #[test]
    fn test_list_kind_accumulates_in_order() {
        let args = schema()
            .parse(&post_body(&[
                ("name", "Whiskers"),
                ("age", "3"),
                ("breed", "siamese"),
                ("tags", "fluffy"),
                ("tags", "indoor"),
            ]))
            .unwrap();
        let tags = args.get("tags").unwrap().as_ref().unwrap();
        assert_eq!(tags.as_list(), Some(&["fluffy".to_string(), "indoor".to_string()][..]));
    }

    #[test]
    fn test_scalar_takes_first_occurrence() {
        let args = schema()
            .parse(&post_body(&[
                ("name", "First"),
                ("name", "Second"),
                ("age", "3"),
                ("breed", "siamese"),
            ]))
            .unwrap();
        assert_eq!(args.opt_str("name"), Some("First"));
    }

    #[test]
    fn test_duplicate_schema_name_rejected() {
        let err = ParserSchema::builder()
            .arg(Argument::new("name"))
            .arg(Argument::new("name"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate argument 'name'"));
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(ArgKind::Bool.coerce("TRUE"), Some(ArgValue::Bool(true)));
        assert_eq!(ArgKind::Bool.coerce("0"), Some(ArgValue::Bool(false)));
        assert_eq!(ArgKind::Bool.coerce("maybe"), None);
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(ArgKind::Float.coerce(" 2.5 "), Some(ArgValue::Float(2.5)));
        assert_eq!(ArgKind::Float.coerce("two"), None);
    }

    #[test]
    fn test_flatten_json_object_normalizes_scalars_and_arrays() {
        let object = serde_json::from_str::<Value>(
            r#"{"name": "Whiskers", "age": 3, "indoor": true, "tags": ["a", "b"], "note": null}"#,
        )
        .unwrap();
        let Value::Object(object) = object else {
            unreachable!()
        };
        let pairs = flatten_json_object(object);
        assert!(pairs.contains(&("name".to_string(), "Whiskers".to_string())));
        assert!(pairs.contains(&("age".to_string(), "3".to_string())));
        assert!(pairs.contains(&("indoor".to_string(), "true".to_string())));
        assert!(pairs.contains(&("tags".to_string(), "a".to_string())));
        assert!(pairs.contains(&("tags".to_string(), "b".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "note"));
    }
}
