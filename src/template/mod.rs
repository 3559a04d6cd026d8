//! Template engine module.
//!
//! Provides a Handlebars-style template engine for rendering HTML pages and
//! plain-text mails.
//!
//! # Features
//!
//! - Variable expansion: `{{variable}}` (HTML-escaped) and `{{{variable}}}` (raw)
//! - Translation reference: `{{t "key"}}` or `{{t "key" name=value}}`
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`
//! - Loops: `{{#each items}}...{{/each}}` or `{{#each items as item}}`
//! - Partials: `{{> includes/form.html}}`
//! - Helpers: `{{input_class field}}`
//! - Comments: `{{! note }}`
//! - Escaping: `\{{` to output literal `{{`
//!
//! # Example
//!
//! ```
//! use forum::template::{TemplateEngine, TemplateContext, Value};
//! use forum::i18n::I18n;
//! use std::sync::Arc;
//!
//! let mut engine = TemplateEngine::new();
//! engine.load("greeting", "Hello, {{name}}!").unwrap();
//!
//! let i18n = Arc::new(I18n::empty("en"));
//! let mut context = TemplateContext::new(i18n);
//! context.set("name", Value::string("<World>"));
//!
//! let result = engine.render("greeting", &context).unwrap();
//! assert_eq!(result, "Hello, &lt;World&gt;!");
//! ```

mod loader;
mod parser;
mod renderer;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::i18n::I18n;

pub use loader::TemplateLoader;
pub use parser::{Node, Parser};
pub use renderer::Renderer;

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Object(HashMap<String, Value>),
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) => "[list]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => "".to_string(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::List(list) => {
                    let index: usize = part.parse().ok()?;
                    current = list.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Convert any serializable value into a template value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Value::from)
            .map_err(|e| TemplateError::Render(format!("Failed to convert value: {e}")))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn number(n: i64) -> Self {
        Value::Number(n)
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    pub fn object(items: HashMap<String, Value>) -> Self {
        Value::Object(items)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Context for template rendering.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
    i18n: Arc<I18n>,
}

impl TemplateContext {
    /// Create a new template context.
    pub fn new(i18n: Arc<I18n>) -> Self {
        Self {
            variables: HashMap::new(),
            i18n,
        }
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Set a variable from any serializable value.
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        self.set(name, Value::from_serialize(value)?);
        Ok(())
    }

    /// Get a variable from the context.
    ///
    /// Dotted names resolve through objects and lists: `user.name`, `posts.0.id`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }

        let (root, rest) = name.split_once('.')?;
        self.variables.get(root)?.get_path(rest)
    }

    /// Get the i18n instance.
    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    /// Create a child context inheriting all variables.
    pub fn child(&self) -> Self {
        Self {
            variables: self.variables.clone(),
            i18n: Arc::clone(&self.i18n),
        }
    }
}

/// A template helper: receives resolved arguments, returns text to be escaped.
pub type Helper = Box<dyn Fn(&[Value]) -> String + Send + Sync>;

/// Template engine holding parsed templates and registered helpers.
#[derive(Default)]
pub struct TemplateEngine {
    templates: HashMap<String, Vec<Node>>,
    helpers: HashMap<String, Helper>,
}

impl TemplateEngine {
    /// Create a new template engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a template from a string.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let name = name.into();
        let nodes = Parser::new(content)
            .parse()
            .map_err(|e| TemplateError::Parse(format!("{name}: {e}")))?;
        self.templates.insert(name, nodes);
        Ok(())
    }

    /// Register a helper callable as `{{name arg...}}`.
    pub fn register_helper<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> String + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Box::new(helper));
    }

    /// Render a template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .nodes(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Renderer::new(self, context).render(nodes)
    }

    /// Render a page inside a layout.
    ///
    /// The page output is exposed to the layout as the raw variable `content`.
    pub fn render_in_layout(
        &self,
        layout: &str,
        name: &str,
        context: &TemplateContext,
    ) -> Result<String> {
        let content = self.render(name, context)?;
        let mut outer = context.child();
        outer.set("content", Value::String(content));
        self.render(layout, &outer)
    }

    /// Render a template string directly without loading.
    pub fn render_string(&self, content: &str, context: &TemplateContext) -> Result<String> {
        let nodes = Parser::new(content).parse()?;
        Renderer::new(self, context).render(&nodes)
    }

    /// Check if a template is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Get the list of loaded template names.
    pub fn template_names(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }

    pub(crate) fn nodes(&self, name: &str) -> Option<&[Node]> {
        self.templates.get(name).map(|nodes| nodes.as_slice())
    }

    pub(crate) fn helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("templates", &self.templates.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}
