//! Stylistic linter
//!
//! Walks the parsed AST and reports naming and declaration issues. Lint
//! findings never stop a build; the CLI maps them to exit code 2 so scripts
//! can tell "clean" from "compiles with complaints".
//!
//! Rules:
//! - W001: identifiers may only contain letters, digits and underscores
//! - W002: identifiers use snake_case
//! - W003: identifiers are at least 3 characters long
//! - W004: no duplicate func/var/const declarations of one name

use crate::compiler::parsers::ast_nodes::AstNode;
use crate::compiler::parsers::sexpr;
use rustc_hash::{FxHashMap, FxHashSet};

pub struct Linter {
    operators: FxHashSet<&'static str>,
    keywords: FxHashSet<&'static str>,
    declarations: FxHashMap<String, u32>,
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

impl Linter {
    pub fn new() -> Linter {
        let operators = FxHashSet::from_iter([
            "+",
            "-",
            "*",
            "/",
            ">",
            "<",
            ">=",
            "<=",
            "==",
            "!=",
            "->",
            "__PLUS_OPERAND__",
            "__SUB_OPERAND__",
            "__MUL_OPERAND__",
            "__DIV_OPERAND__",
            "__CMPG__",
            "__CMPL__",
            "__CMPGE__",
            "__CMPLE__",
            "__CMPEQ__",
            "__CMPNE__",
        ]);

        let keywords = FxHashSet::from_iter([
            "func", "scope", "fprint", "finput", "check", "if", "elif", "else", "while", "loop",
            "for", "break", "continue", "set", "var", "const", "true", "false", "array", "index",
            "sizeof", "mem-alloc", "mem-free", "mem-read", "mem-write", "mem-ptr", "mem-deref",
            "byte-read", "byte-write", "bit-and", "bit-or", "bit-xor", "bit-shl", "bit-shr",
            "bit-not",
        ]);

        Linter {
            operators,
            keywords,
            declarations: FxHashMap::default(),
        }
    }

    /// Parse-only pass; any failure comes back as a single E001 finding.
    pub fn check_syntax(&self, code: &str) -> Vec<String> {
        match sexpr::parse(&format!("[scope {code}]")) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("E001: Syntax error: {}", e.msg)],
        }
    }

    pub fn lint(&mut self, ast: &AstNode) -> Vec<String> {
        let mut issues = Vec::new();
        self.declarations.clear();
        self.traverse(ast, &mut issues);
        issues
    }

    fn traverse(&mut self, node: &AstNode, issues: &mut Vec<String>) {
        self.apply_rules(node, issues);

        if let AstNode::List(children) = node {
            for child in children {
                self.traverse(child, issues);
            }
        }
    }

    fn apply_rules(&mut self, node: &AstNode, issues: &mut Vec<String>) {
        self.rule_identifier_charset(node, issues);
        self.rule_snake_case(node, issues);
        self.rule_min_length(node, issues);
        self.rule_duplicate_declarations(node, issues);
    }

    fn is_exempt(&self, name: &str) -> bool {
        // Type tags are symbols too but follow their own grammar
        self.operators.contains(name) || self.keywords.contains(name) || name.starts_with('!')
    }

    fn rule_identifier_charset(&self, node: &AstNode, issues: &mut Vec<String>) {
        let AstNode::Symbol(name) = node else {
            return;
        };

        if self.is_exempt(name) || is_valid_identifier(name) {
            return;
        }

        let suggestion = if name.contains('-') {
            name.replace('-', "_")
        } else {
            let cleaned: String = name
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if cleaned.is_empty() {
                "valid_name".to_string()
            } else {
                cleaned
            }
        };

        issues.push(format!(
            "W001: Invalid identifier '{name}'\n  Contains invalid characters (only a-z, 0-9, _ allowed)\n  Suggested fix: use '{suggestion}' instead"
        ));
    }

    fn rule_snake_case(&self, node: &AstNode, issues: &mut Vec<String>) {
        let AstNode::Symbol(name) = node else {
            return;
        };

        if self.is_exempt(name) || !is_valid_identifier(name) {
            return;
        }

        if name.chars().any(|c| c.is_uppercase()) {
            let suggestion = suggest_snake_case(name);
            issues.push(format!(
                "W002: Not snake_case: '{name}'\n  Suggested fix: use '{suggestion}' instead\n  Example: [var {suggestion} 10]"
            ));
        }
    }

    fn rule_min_length(&self, node: &AstNode, issues: &mut Vec<String>) {
        let AstNode::Symbol(name) = node else {
            return;
        };

        if self.is_exempt(name) || !is_valid_identifier(name) {
            return;
        }

        if name.len() < 3 {
            let suggestion = format!("{name}_value");
            issues.push(format!(
                "W003: Identifier too short: '{name}' ({} chars)\n  Suggested fix: use '{suggestion}' instead\n  Example: [var {suggestion} 10]",
                name.len()
            ));
        }
    }

    fn rule_duplicate_declarations(&mut self, node: &AstNode, issues: &mut Vec<String>) {
        let AstNode::List(items) = node else {
            return;
        };

        let Some(head) = items.first().and_then(|h| h.as_symbol()) else {
            return;
        };

        if head != "func" && head != "var" && head != "const" {
            return;
        }

        // The declared name is a bare symbol or the head of (NAME !type)
        let name = match items.get(1) {
            Some(AstNode::Symbol(name)) => name.clone(),
            Some(AstNode::List(decl)) => match decl.first() {
                Some(AstNode::Symbol(name)) => name.clone(),
                _ => return,
            },
            _ => return,
        };

        if !is_valid_identifier(&name) {
            return;
        }

        let count = self.declarations.entry(name.clone()).or_insert(0);
        *count += 1;

        if *count > 1 {
            let suggestion = format!("{name}_2");
            issues.push(format!(
                "W004: Duplicate declaration: '{name}'\n  Suggested fix: rename to '{suggestion}'\n  Example: [var {suggestion} value]"
            ));
        }
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    if !first.is_alphabetic() && first != '_' {
        return false;
    }

    name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn suggest_snake_case(name: &str) -> String {
    let mut suggestion = String::with_capacity(name.len() + name.len() / 2);

    for c in name.chars() {
        if c.is_uppercase() {
            if !suggestion.is_empty() && !suggestion.ends_with('_') {
                suggestion.push('_');
            }
            suggestion.extend(c.to_lowercase());
        } else if c == '-' {
            suggestion.push('_');
        } else if c.is_alphanumeric() || c == '_' {
            suggestion.push(c);
        }
    }

    while suggestion.contains("__") {
        suggestion = suggestion.replace("__", "_");
    }

    let trimmed = suggestion.trim_matches('_').to_string();

    if trimmed.is_empty() {
        "valid_name".to_string()
    } else {
        trimmed
    }
}
