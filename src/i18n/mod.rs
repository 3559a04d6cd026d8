//! Internationalization (i18n) module.
//!
//! UI strings live in TOML catalogues (`locales/{locale}.toml`). Nested
//! tables are flattened into dot-separated keys.
//!
//! # Usage
//!
//! ```
//! use forum::i18n::I18n;
//!
//! let i18n = I18n::from_str("en", r#"
//! [topic]
//! started_by = "Started by {{name}}"
//! "#).unwrap();
//!
//! assert_eq!(i18n.t_with("topic.started_by", &[("name", "john")]), "Started by john");
//! assert_eq!(i18n.t("missing.key"), "missing.key");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Default locale.
pub const DEFAULT_LOCALE: &str = "en";

/// I18n-related errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to read locale file.
    #[error("Failed to read locale file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse locale file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Locale not found.
    #[error("Locale not found: {0}")]
    LocaleNotFound(String),
}

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// A message catalogue for one locale.
#[derive(Debug, Clone)]
pub struct I18n {
    locale: String,
    messages: HashMap<String, String>,
}

impl I18n {
    /// Load `{locale}.toml` from `locales_dir`.
    pub fn load<P: AsRef<Path>>(locale: &str, locales_dir: P) -> Result<Self> {
        let path = locales_dir.as_ref().join(format!("{locale}.toml"));

        if !path.exists() {
            return Err(I18nError::LocaleNotFound(locale.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        Self::from_str(locale, &content)
    }

    /// Create a catalogue from a TOML string.
    pub fn from_str(locale: &str, content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let mut messages = HashMap::new();
        flatten_toml("", &toml::Value::Table(table), &mut messages);

        Ok(Self {
            locale: locale.to_string(),
            messages,
        })
    }

    /// Create an empty catalogue; every lookup returns its key.
    pub fn empty(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            messages: HashMap::new(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Translate a key, or return the key itself if it is unknown.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    /// Translate a key, replacing `{{name}}` placeholders with `params`.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut result = self.t(key).to_string();

        for (name, value) in params {
            let placeholder = format!("{{{{{name}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Translate a key with an explicit fallback.
    pub fn t_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.messages
            .get(key)
            .map(|s| s.as_str())
            .unwrap_or(fallback)
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::empty(DEFAULT_LOCALE)
    }
}

fn flatten_toml(prefix: &str, value: &toml::Value, map: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_toml(&new_prefix, val, map);
            }
        }
        toml::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            map.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Float(f) => {
            map.insert(prefix.to_string(), f.to_string());
        }
        toml::Value::Boolean(b) => {
            map.insert(prefix.to_string(), b.to_string());
        }
        toml::Value::Datetime(dt) => {
            map.insert(prefix.to_string(), dt.to_string());
        }
        // Arrays carry no translatable text
        toml::Value::Array(_) => {}
    }
}
