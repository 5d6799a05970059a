//! Minimal stylesheet syntax tree handed to stylesheet plugins.
//!
//! The tree keeps every raw whitespace run next to the node it precedes so that
//! serialising an untouched stylesheet reproduces the input byte for byte. Tokenising
//! is left to `cssparser`; the tree is not validated, so anything it does not
//! recognise is carried through as declaration or selector text.

mod parser;

use std::path::{Path, PathBuf};

/// One parsed stylesheet file together with the source it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    path: Option<PathBuf>,
    source: String,
    /// Top level nodes in source order.
    pub nodes: Vec<Node>,
    /// Whitespace trailing the last top level node.
    pub after: String,
}

/// A node of the stylesheet tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A qualified rule such as `.a, .b { ... }`.
    Rule(Rule),
    /// An at-rule, with or without a block.
    AtRule(AtRule),
    /// A `property: value` pair.
    Declaration(Declaration),
    /// A `/* ... */` comment.
    Comment(Comment),
}

/// Qualified rule with a selector and a block of child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Whitespace preceding the selector.
    pub before: String,
    /// Selector text without trailing whitespace.
    pub selector: String,
    /// Whitespace between the selector and `{`.
    pub between: String,
    /// Child nodes in source order.
    pub nodes: Vec<Node>,
    /// Whitespace preceding the closing `}`.
    pub after: String,
}

/// At-rule such as `@media`, `@import` or `@font-face`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Whitespace preceding the `@`.
    pub before: String,
    /// Name without the leading `@`.
    pub name: String,
    /// Whitespace between the name and the params.
    pub after_name: String,
    /// Prelude text without trailing whitespace.
    pub params: String,
    /// Whitespace between the params and `{` or `;`.
    pub between: String,
    /// Block contents, `None` for statement at-rules.
    pub nodes: Option<Vec<Node>>,
    /// Whitespace preceding the closing `}`.
    pub after: String,
    /// Whether a statement at-rule was terminated by `;`.
    pub semicolon: bool,
}

/// Declaration belonging to a rule or at-rule block.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Whitespace preceding the property.
    pub before: String,
    /// Property name as written.
    pub prop: String,
    /// Raw text between the property and the value: the colon plus any whitespace and
    /// comments ahead of the value.
    pub between: String,
    /// Value text. Comments between value components are kept; leading and trailing
    /// comments, the `!important` flag and trailing whitespace are not.
    pub value: String,
    /// Whether the declaration carries `!important`.
    pub important: bool,
    /// Raw text between the value and the terminator: whitespace, comments, `!important`.
    pub suffix: String,
    /// Whether the declaration was terminated by `;`.
    pub semicolon: bool,
}

/// Comment node.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Whitespace preceding `/*`.
    pub before: String,
    /// Comment body with surrounding whitespace removed.
    pub text: String,
    /// Whitespace between `/*` and the text.
    pub left: String,
    /// Whitespace between the text and `*/`.
    pub right: String,
}

impl Stylesheet {
    /// Parse stylesheet source text. `path` identifies the file for admission filters.
    pub fn parse(source: impl Into<String>, path: Option<PathBuf>) -> Self {
        let source = source.into();
        let (nodes, after) = parser::parse(&source);
        Self {
            path,
            source,
            nodes,
            after,
        }
    }

    /// Path of the file the stylesheet was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Original source text as handed to [`Stylesheet::parse`].
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Visit every rule depth-first, including rules nested in at-rule blocks.
    pub fn walk_rules_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Rule),
    {
        walk_rules(&mut self.nodes, &mut visit);
    }

    /// Serialise the tree back into CSS text.
    pub fn to_css(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        write_nodes(&mut out, &self.nodes);
        out.push_str(&self.after);
        out
    }
}

impl Declaration {
    /// Clone the declaration with a different value, terminated so it can precede a sibling.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            suffix: self.suffix.trim_end().to_string(),
            semicolon: true,
            ..self.clone()
        }
    }
}

fn walk_rules<F>(nodes: &mut [Node], visit: &mut F)
where
    F: FnMut(&mut Rule),
{
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                visit(rule);
                walk_rules(&mut rule.nodes, visit);
            }
            Node::AtRule(AtRule {
                nodes: Some(children),
                ..
            }) => walk_rules(children, visit),
            _ => {}
        }
    }
}

fn write_nodes(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                out.push_str(&rule.before);
                out.push_str(&rule.selector);
                out.push_str(&rule.between);
                out.push('{');
                write_nodes(out, &rule.nodes);
                out.push_str(&rule.after);
                out.push('}');
            }
            Node::AtRule(at_rule) => {
                out.push_str(&at_rule.before);
                out.push('@');
                out.push_str(&at_rule.name);
                out.push_str(&at_rule.after_name);
                out.push_str(&at_rule.params);
                out.push_str(&at_rule.between);
                match &at_rule.nodes {
                    Some(children) => {
                        out.push('{');
                        write_nodes(out, children);
                        out.push_str(&at_rule.after);
                        out.push('}');
                    }
                    None if at_rule.semicolon => out.push(';'),
                    None => {}
                }
            }
            Node::Declaration(decl) => {
                out.push_str(&decl.before);
                out.push_str(&decl.prop);
                out.push_str(&decl.between);
                out.push_str(&decl.value);
                out.push_str(&decl.suffix);
                if decl.semicolon {
                    out.push(';');
                }
            }
            Node::Comment(comment) => {
                out.push_str(&comment.before);
                out.push_str("/*");
                out.push_str(&comment.left);
                out.push_str(&comment.text);
                out.push_str(&comment.right);
                out.push_str("*/");
            }
        }
    }
}
