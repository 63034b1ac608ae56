//! AST node definitions
//!
//! The reader produces this tree and every later stage consumes it.
//! Bracket shape (`[...]` vs `(...)`) is normalized away by the parser,
//! so a list is just a list by the time it gets here.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// 64-bit signed integer literal
    Number(i64),

    /// 64-bit IEEE-754 double literal
    Fractional(f64),

    /// Identifier, operator or special-form head
    Symbol(String),

    /// Raw string literal (escapes are interpreted at codegen time)
    Str(String),

    /// Ordered sequence of child nodes
    List(Vec<AstNode>),
}

impl AstNode {
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, AstNode::Symbol(s) if s == name)
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            AstNode::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AstNode]> {
        match self {
            AstNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders the node back into bracketed source form, truncating anything
    /// longer than 120 characters. Used by the expression traceback and by
    /// error messages, so it must never panic on malformed trees.
    pub fn render_truncated(&self) -> String {
        const LIMIT: usize = 120;

        let full = self.render();
        if full.len() > LIMIT {
            let mut cut = LIMIT - 3;
            while !full.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &full[..cut])
        } else {
            full
        }
    }

    fn render(&self) -> String {
        match self {
            AstNode::Number(n) => n.to_string(),
            AstNode::Fractional(x) => x.to_string(),
            AstNode::Symbol(s) => s.clone(),
            AstNode::Str(s) => format!("\"{s}\""),
            AstNode::List(items) => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                let inner: Vec<String> = items.iter().map(|e| e.render()).collect();
                format!("[{}]", inner.join(" "))
            }
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
