//! Template loader module.
//!
//! Loads every `.html` and `.txt` file below a directory into a
//! [`TemplateEngine`], named by its path relative to that directory
//! (e.g. `boards/topics.html`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Result, TemplateEngine, TemplateError};

const TEMPLATE_EXTENSIONS: &[&str] = &["html", "txt"];

/// Template loader reading from a base directory.
#[derive(Debug)]
pub struct TemplateLoader {
    base_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader for `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Read a single template by name.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.base_path.join(name);

        if !path.is_file() {
            return Err(TemplateError::NotFound(format!(
                "Template '{name}' not found at {path:?}"
            )));
        }

        fs::read_to_string(&path)
            .map_err(|e| TemplateError::Render(format!("Failed to read template '{name}': {e}")))
    }

    /// List available template names, sorted.
    pub fn list_templates(&self) -> Result<Vec<String>> {
        if !self.base_path.is_dir() {
            return Err(TemplateError::NotFound(format!(
                "Template directory {:?} does not exist",
                self.base_path
            )));
        }

        let mut templates = Vec::new();
        collect_templates_recursive(&self.base_path, "", &mut templates)?;
        templates.sort();
        Ok(templates)
    }

    /// Load every template into `engine`.
    ///
    /// Returns the number of templates loaded.
    pub fn load_into(&self, engine: &mut TemplateEngine) -> Result<usize> {
        let names = self.list_templates()?;
        for name in &names {
            let content = self.read(name)?;
            engine.load(name.clone(), &content)?;
            debug!("Loaded template {}", name);
        }
        Ok(names.len())
    }

    /// Build an engine holding every template below the base path.
    pub fn load_engine(&self) -> Result<TemplateEngine> {
        let mut engine = TemplateEngine::new();
        self.load_into(&mut engine)?;
        Ok(engine)
    }
}

fn collect_templates_recursive(
    dir: &Path,
    prefix: &str,
    templates: &mut Vec<String>,
) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| TemplateError::Render(format!("Failed to read directory {dir:?}: {e}")))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| TemplateError::Render(format!("Failed to read entry: {e}")))?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();
        let name = if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        };

        if path.is_dir() {
            collect_templates_recursive(&path, &name, templates)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        {
            templates.push(name);
        }
    }

    Ok(())
}
