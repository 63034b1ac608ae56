//! Expression traceback
//!
//! A thread-local ring buffer of the expressions the codegen dispatcher has
//! entered, capped at 100 entries. On a fatal error the last 5 are printed so
//! the user can see where in their program the compiler gave up. Each entry
//! is a `(context, rendered_form)` pair where the context is the head symbol
//! of a list form.

use colour::e_cyan;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::compiler::parsers::ast_nodes::AstNode;

const MAX_STACK_SIZE: usize = 100;
const TRACEBACK_LIMIT: usize = 5;

thread_local! {
    static EXPRESSION_STACK: RefCell<VecDeque<(String, String)>> =
        RefCell::new(VecDeque::with_capacity(MAX_STACK_SIZE));
}

/// Record an expression on its way into the dispatcher.
pub fn push_expression(exp: &AstNode) {
    let context = match exp {
        AstNode::List(items) => match items.first() {
            Some(AstNode::Symbol(head)) => head.clone(),
            Some(_) => "list".to_string(),
            None => "list".to_string(),
        },
        AstNode::Str(_) => "string".to_string(),
        AstNode::Fractional(_) => "fractional".to_string(),
        _ => "expr".to_string(),
    };

    EXPRESSION_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.len() >= MAX_STACK_SIZE {
            stack.pop_front();
        }
        stack.push_back((context, exp.render_truncated()));
    });
}

/// Print the last few recorded expressions to stderr, oldest first.
pub fn print_traceback() {
    EXPRESSION_STACK.with(|stack| {
        let stack = stack.borrow();
        if stack.is_empty() {
            return;
        }

        eprintln!("Expressions traceback:");

        let start = stack.len().saturating_sub(TRACEBACK_LIMIT);
        for (ctx, expr) in stack.iter().skip(start) {
            e_cyan!("    {:<8}", ctx);
            eprintln!(" {expr}");
        }
    });
}

/// Drop all recorded expressions. Tests and the linter run several
/// compilations in one process, so the buffer has to be resettable.
pub fn clear() {
    EXPRESSION_STACK.with(|stack| stack.borrow_mut().clear());
}
