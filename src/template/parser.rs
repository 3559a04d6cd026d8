//! Template parser module.
//!
//! Parses template strings into a list of nodes.

use super::{Result, TemplateError};

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text content.
    Text(String),

    /// Variable reference: `{{name}}` (escaped) or `{{{name}}}` (raw).
    Variable { name: String, raw: bool },

    /// Translation reference: `{{t "key"}}` or `{{t "key" param=value}}`
    Translation {
        key: String,
        params: Vec<(String, String)>,
    },

    /// Helper call: `{{input_class field}}`
    Helper { name: String, args: Vec<String> },

    /// Partial inclusion: `{{> includes/form.html}}`
    Partial(String),

    /// Conditional block: `{{#if condition}}...{{else}}...{{/if}}`
    If {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// Loop block: `{{#each items}}...{{/each}}` or `{{#each items as item}}`
    Each {
        variable: String,
        item_name: Option<String>,
        body: Vec<Node>,
    },

    /// Unless block (inverse of if): `{{#unless condition}}...{{/unless}}`
    Unless { condition: String, body: Vec<Node> },

    /// With block (scope change): `{{#with object}}...{{/with}}`
    With { variable: String, body: Vec<Node> },
}

/// Template parser.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse the template into a list of nodes.
    pub fn parse(mut self) -> Result<Vec<Node>> {
        let nodes = self.parse_nodes(None)?;
        if self.pos < self.input.len() {
            let found: String = self.input[self.pos..].chars().take(12).collect();
            return Err(TemplateError::Parse(format!(
                "Unexpected closing tag '{found}'"
            )));
        }
        Ok(nodes)
    }

    fn parse_nodes(&mut self, end_tag: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        while self.pos < self.input.len() {
            if let Some(tag) = end_tag {
                if self.peek_str(&format!("{{{{/{tag}}}}}")) {
                    break;
                }
                if tag == "if" && self.peek_str("{{else}}") {
                    break;
                }
            } else if self.peek_str("{{/") || self.peek_str("{{else}}") {
                break;
            }

            if self.peek_str("\\{{") {
                self.pos += 3;
                nodes.push(Node::Text("{{".to_string()));
            } else if self.peek_str("{{!") {
                self.skip_comment()?;
            } else if self.peek_str("{{") {
                let node = self.parse_tag()?;
                nodes.push(node);
            } else {
                let text = self.collect_text();
                if !text.is_empty() {
                    nodes.push(Node::Text(text));
                }
            }
        }

        if let Some(tag) = end_tag {
            if self.pos >= self.input.len() {
                return Err(TemplateError::Parse(format!("Unclosed block: {tag}")));
            }
        }

        Ok(nodes)
    }

    fn parse_tag(&mut self) -> Result<Node> {
        if self.peek_str("{{{") {
            self.expect("{{{")?;
            self.skip_whitespace();
            let name = self.parse_identifier()?;
            self.skip_whitespace();
            self.expect("}}}")?;
            return Ok(Node::Variable { name, raw: true });
        }

        self.expect("{{")?;
        self.skip_whitespace();

        match self.peek_char() {
            Some('#') => {
                self.advance();
                self.skip_whitespace();
                return self.parse_block_tag();
            }
            Some('>') => {
                self.advance();
                self.skip_whitespace();
                let name = self.parse_path()?;
                self.skip_whitespace();
                self.expect("}}")?;
                return Ok(Node::Partial(name));
            }
            _ => {}
        }

        if self.peek_str("t ") || self.peek_str("t\"") {
            return self.parse_translation();
        }

        let name = self.parse_identifier()?;
        self.skip_whitespace();

        let mut args = Vec::new();
        while self.peek_char() != Some('}') {
            if self.pos >= self.input.len() {
                return Err(TemplateError::Parse("Unterminated tag".to_string()));
            }
            let arg = if self.peek_char() == Some('"') {
                format!("\"{}\"", self.parse_quoted_string()?)
            } else {
                self.parse_identifier()?
            };
            args.push(arg);
            self.skip_whitespace();
        }
        self.expect("}}")?;

        if args.is_empty() {
            Ok(Node::Variable { name, raw: false })
        } else {
            Ok(Node::Helper { name, args })
        }
    }

    fn parse_block_tag(&mut self) -> Result<Node> {
        let tag_name = self.parse_identifier()?;
        self.skip_whitespace();

        match tag_name.as_str() {
            "if" => self.parse_if_block(),
            "each" => self.parse_each_block(),
            "unless" => self.parse_unless_block(),
            "with" => self.parse_with_block(),
            _ => Err(TemplateError::Parse(format!(
                "Unknown block tag: {tag_name}"
            ))),
        }
    }

    fn parse_if_block(&mut self) -> Result<Node> {
        let condition = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect("}}")?;

        let then_branch = self.parse_nodes(Some("if"))?;

        let else_branch = if self.peek_str("{{else}}") {
            self.expect("{{else}}")?;
            self.parse_nodes(Some("if"))?
        } else {
            Vec::new()
        };

        self.expect("{{/if}}")?;

        Ok(Node::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_each_block(&mut self) -> Result<Node> {
        let variable = self.parse_identifier()?;
        self.skip_whitespace();

        let item_name = if self.peek_str("as ") {
            self.expect("as ")?;
            self.skip_whitespace();
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.skip_whitespace();
        self.expect("}}")?;

        let body = self.parse_nodes(Some("each"))?;
        self.expect("{{/each}}")?;

        Ok(Node::Each {
            variable,
            item_name,
            body,
        })
    }

    fn parse_unless_block(&mut self) -> Result<Node> {
        let condition = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect("}}")?;

        let body = self.parse_nodes(Some("unless"))?;
        self.expect("{{/unless}}")?;

        Ok(Node::Unless { condition, body })
    }

    fn parse_with_block(&mut self) -> Result<Node> {
        let variable = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect("}}")?;

        let body = self.parse_nodes(Some("with"))?;
        self.expect("{{/with}}")?;

        Ok(Node::With { variable, body })
    }

    fn parse_translation(&mut self) -> Result<Node> {
        self.expect("t")?;
        self.skip_whitespace();

        let key = self.parse_quoted_string()?;
        self.skip_whitespace();

        let mut params = Vec::new();
        while self.peek_char() != Some('}') {
            let param_name = self.parse_identifier()?;
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();

            // Quotes mark a literal for the renderer
            let param_value = if self.peek_char() == Some('"') {
                format!("\"{}\"", self.parse_quoted_string()?)
            } else {
                self.parse_identifier()?
            };

            params.push((param_name, param_value));
            self.skip_whitespace();
        }

        self.expect("}}")?;

        Ok(Node::Translation { key, params })
    }

    fn parse_quoted_string(&mut self) -> Result<String> {
        self.expect("\"")?;

        let start = self.pos;
        while self.pos < self.input.len() {
            let ch = self.current_char();
            if ch == '"' {
                let s = self.input[start..self.pos].to_string();
                self.advance();
                return Ok(s);
            }
            if ch == '\\' && self.pos + 1 < self.input.len() {
                self.advance();
            }
            self.advance();
        }

        Err(TemplateError::Parse("Unterminated string".to_string()))
    }

    /// Parse an identifier (variable name, including dot notation and `@index`).
    fn parse_identifier(&mut self) -> Result<String> {
        self.take_while(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '@'))
    }

    /// Parse a template path for partials.
    fn parse_path(&mut self) -> Result<String> {
        self.take_while(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '/'))
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> Result<String> {
        let start = self.pos;

        while self.pos < self.input.len() && accept(self.current_char()) {
            self.advance();
        }

        if self.pos == start {
            let found: String = self.input[self.pos..].chars().take(10).collect();
            return Err(TemplateError::Parse(format!(
                "Expected identifier but found '{found}'"
            )));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn skip_comment(&mut self) -> Result<()> {
        match self.input[self.pos..].find("}}") {
            Some(end) => {
                self.pos += end + 2;
                Ok(())
            }
            None => Err(TemplateError::Parse("Unterminated comment".to_string())),
        }
    }

    fn collect_text(&mut self) -> String {
        let start = self.pos;

        while self.pos < self.input.len() {
            if self.peek_str("{{") || self.peek_str("\\{{") {
                break;
            }
            self.advance();
        }

        self.input[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += self.current_char().len_utf8();
        }
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.peek_str(s) {
            self.pos += s.len();
            Ok(())
        } else {
            let found: String = self.input[self.pos..].chars().take(10).collect();
            Err(TemplateError::Parse(format!(
                "Expected '{s}' but found '{found}'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Node {
        Node::Variable {
            name: name.to_string(),
            raw: false,
        }
    }

    #[test]
    fn test_parse_text_and_variables() {
        let nodes = Parser::new("Hello, {{ user.name }}!").parse().unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("Hello, ".to_string()),
                var("user.name"),
                Node::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_raw_variable() {
        let nodes = Parser::new("{{{content}}}").parse().unwrap();
        assert_eq!(
            nodes,
            vec![Node::Variable {
                name: "content".to_string(),
                raw: true
            }]
        );
    }

    #[test]
    fn test_parse_translation_with_params() {
        let nodes = Parser::new(r#"{{t "topic.by" name=user.name page="2"}}"#)
            .parse()
            .unwrap();
        assert_eq!(
            nodes,
            vec![Node::Translation {
                key: "topic.by".to_string(),
                params: vec![
                    ("name".to_string(), "user.name".to_string()),
                    ("page".to_string(), "\"2\"".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn test_parse_helper() {
        let nodes = Parser::new("{{input_class field}}").parse().unwrap();
        assert_eq!(
            nodes,
            vec![Node::Helper {
                name: "input_class".to_string(),
                args: vec!["field".to_string()],
            }]
        );
    }

    #[test]
    fn test_parse_partial() {
        let nodes = Parser::new("{{> includes/form.html }}").parse().unwrap();
        assert_eq!(nodes, vec![Node::Partial("includes/form.html".to_string())]);
    }

    #[test]
    fn test_parse_if_else() {
        let nodes = Parser::new("{{#if user}}hi{{else}}login{{/if}}")
            .parse()
            .unwrap();
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: "user".to_string(),
                then_branch: vec![Node::Text("hi".to_string())],
                else_branch: vec![Node::Text("login".to_string())],
            }]
        );
    }

    #[test]
    fn test_parse_each_as() {
        let nodes = Parser::new("{{#each posts as post}}{{post.id}}{{/each}}")
            .parse()
            .unwrap();
        assert_eq!(
            nodes,
            vec![Node::Each {
                variable: "posts".to_string(),
                item_name: Some("post".to_string()),
                body: vec![var("post.id")],
            }]
        );
    }

    #[test]
    fn test_parse_nested_blocks() {
        let nodes = Parser::new("{{#with form}}{{#unless bound}}x{{/unless}}{{/with}}")
            .parse()
            .unwrap();
        assert_eq!(
            nodes,
            vec![Node::With {
                variable: "form".to_string(),
                body: vec![Node::Unless {
                    condition: "bound".to_string(),
                    body: vec![Node::Text("x".to_string())],
                }],
            }]
        );
    }

    #[test]
    fn test_parse_comment_and_escape() {
        let nodes = Parser::new("a{{! ignored }}b\\{{c").parse().unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("a".to_string()),
                Node::Text("b".to_string()),
                Node::Text("{{".to_string()),
                Node::Text("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Parser::new("{{#if x}}open").parse().is_err());
        assert!(Parser::new("{{#loop x}}{{/loop}}").parse().is_err());
        assert!(Parser::new("stray {{/if}}").parse().is_err());
        assert!(Parser::new("{{t \"unterminated}}").parse().is_err());
        assert!(Parser::new("{{name").parse().is_err());
    }
}
