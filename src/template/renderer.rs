//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{escape_html, Result, TemplateContext, TemplateEngine, TemplateError, Value};

/// Maximum nesting of partials.
const MAX_PARTIAL_DEPTH: usize = 16;

/// Template renderer.
pub struct Renderer<'a> {
    engine: &'a TemplateEngine,
    context: &'a TemplateContext,
    depth: usize,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(engine: &'a TemplateEngine, context: &'a TemplateContext) -> Self {
        Self {
            engine,
            context,
            depth: 0,
        }
    }

    fn nested<'b>(&self, context: &'b TemplateContext) -> Renderer<'b>
    where
        'a: 'b,
    {
        Renderer {
            engine: self.engine,
            context,
            depth: self.depth,
        }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            self.render_node(node, &mut output)?;
        }

        Ok(output)
    }

    fn render_node(&self, node: &Node, output: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Variable { name, raw } => {
                let text = self.resolve(name);
                if *raw {
                    output.push_str(&text);
                } else {
                    output.push_str(&escape_html(&text));
                }
            }
            Node::Translation { key, params } => {
                output.push_str(&self.render_translation(key, params));
            }
            Node::Helper { name, args } => {
                output.push_str(&escape_html(&self.render_helper(name, args)?));
            }
            Node::Partial(name) => output.push_str(&self.render_partial(name)?),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.is_truthy(condition) {
                    output.push_str(&self.render(then_branch)?);
                } else {
                    output.push_str(&self.render(else_branch)?);
                }
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => output.push_str(&self.render_each(variable, item_name.as_deref(), body)?),
            Node::Unless { condition, body } => {
                if !self.is_truthy(condition) {
                    output.push_str(&self.render(body)?);
                }
            }
            Node::With { variable, body } => output.push_str(&self.render_with(variable, body)?),
        }
        Ok(())
    }

    /// Resolve a variable to its display string; missing variables render empty.
    fn resolve(&self, name: &str) -> String {
        self.context
            .get(name)
            .map(|v| v.to_display_string())
            .unwrap_or_default()
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context
            .get(name)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    /// Translation text is trusted; substituted values are escaped.
    fn render_translation(&self, key: &str, params: &[(String, String)]) -> String {
        let i18n = self.context.i18n();

        if params.is_empty() {
            return i18n.t(key).to_string();
        }

        let resolved: Vec<(&str, String)> = params
            .iter()
            .map(|(name, value)| {
                let text = match literal(value) {
                    Some(lit) => lit.to_string(),
                    None => self.resolve(value),
                };
                (name.as_str(), escape_html(&text))
            })
            .collect();

        let refs: Vec<(&str, &str)> = resolved
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();

        i18n.t_with(key, &refs)
    }

    fn render_helper(&self, name: &str, args: &[String]) -> Result<String> {
        let helper = self
            .engine
            .helper(name)
            .ok_or_else(|| TemplateError::Render(format!("Unknown helper: {name}")))?;

        let values: Vec<Value> = args
            .iter()
            .map(|arg| match literal(arg) {
                Some(lit) => Value::String(lit.to_string()),
                None => self.context.get(arg).cloned().unwrap_or(Value::Null),
            })
            .collect();

        Ok(helper(&values))
    }

    fn render_partial(&self, name: &str) -> Result<String> {
        if self.depth >= MAX_PARTIAL_DEPTH {
            return Err(TemplateError::Render(format!(
                "Partial nesting too deep at '{name}'"
            )));
        }

        let nodes = self
            .engine
            .nodes(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        let renderer = Renderer {
            engine: self.engine,
            context: self.context,
            depth: self.depth + 1,
        };
        renderer.render(nodes)
    }

    fn render_each(
        &self,
        variable: &str,
        item_name: Option<&str>,
        body: &[Node],
    ) -> Result<String> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(String::new()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let mut output = String::new();
        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            let mut child_context = self.context.child();

            // Bare `each` exposes object fields directly
            if item_name.is_none() {
                if let Value::Object(obj) = item {
                    for (key, value) in obj {
                        child_context.set(key.clone(), value.clone());
                    }
                }
            }

            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            output.push_str(&self.nested(&child_context).render(body)?);
        }

        Ok(output)
    }

    fn render_with(&self, variable: &str, body: &[Node]) -> Result<String> {
        let value = match self.context.get(variable) {
            Some(v) => v.clone(),
            None => return Ok(String::new()),
        };

        let mut child_context = self.context.child();

        if let Value::Object(obj) = &value {
            for (key, val) in obj {
                child_context.set(key.clone(), val.clone());
            }
        }

        child_context.set("this", value);

        self.nested(&child_context).render(body)
    }
}

/// Strip the quotes of a literal argument, or `None` for a variable reference.
fn literal(arg: &str) -> Option<&str> {
    if arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"') {
        Some(&arg[1..arg.len() - 1])
    } else {
        None
    }
}
