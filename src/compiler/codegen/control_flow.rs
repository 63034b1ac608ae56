//! Conditionals and loops
//!
//! Every handler here follows the same discipline: build the block skeleton
//! up front, generate each arm with the insertion point parked inside it,
//! and only fall through to a merge block when the arm didn't already
//! terminate itself (a `break` or `continue` inside the arm leaves its last
//! block terminated). Values that survive to the merge point are joined with
//! a φ whose incoming list matches the real predecessors.

use crate::compiler::codegen::environment::{Scope, ScopeRef};
use crate::compiler::codegen::generate::{Codegen, LoopFrame};
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::ir::nodes::{Inst, Terminator, Value};
use crate::compiler::ir::types::IrType;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{codegen_log, return_rule_error, return_syntax_error, return_type_error};

impl Codegen {
    /// `(check COND THEN ELSE)`: exactly two arms, merged with a φ when
    /// both reach the join point.
    pub(crate) fn gen_check(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 4 {
            return_syntax_error!("check requires a condition, a then-branch and an else-branch");
        }

        let cond = self.gen(&items[1], env)?;
        let cond = self.to_condition(cond)?;

        let then_block = self.new_block("then");
        let else_block = self.new_block("else");
        let end_block = self.new_block("ifend");

        self.terminate(Terminator::CondBr {
            cond,
            then_label: self.block_label(then_block),
            else_label: self.block_label(else_block),
        });

        self.set_insert(then_block);
        let then_value = self.gen(&items[2], env)?;
        let then_reaches = !self.is_terminated();
        let then_end = self.insert_index();
        let then_end_label = self.insert_label();
        if then_reaches {
            self.branch_to(end_block);
        }

        self.set_insert(else_block);
        let else_value = self.gen(&items[3], env)?;
        let else_reaches = !self.is_terminated();
        let else_end = self.insert_index();
        let else_end_label = self.insert_label();
        if else_reaches {
            self.branch_to(end_block);
        }

        self.set_insert(end_block);

        match (then_reaches, else_reaches) {
            (true, true) => self.merge_branch_values(
                vec![
                    (then_value, then_end_label, then_end),
                    (else_value, else_end_label, else_end),
                ],
                "check",
            ),
            (true, false) => Ok(then_value),
            (false, true) => Ok(else_value),
            (false, false) => Ok(Value::zero_i64()),
        }
    }

    /// Joins the surviving branch values of a conditional with a φ in the
    /// current (merge) block. Numeric arms of different widths are widened
    /// to a common type first, with the casts landing in the predecessor
    /// blocks; any mismatch beyond the widening rules is fatal.
    fn merge_branch_values(
        &mut self,
        arms: Vec<(Value, String, usize)>,
        form: &str,
    ) -> Result<Value, CompileError> {
        let first_ty = arms[0].0.ty();

        let all_equal = arms.iter().all(|(value, _, _)| value.ty() == first_ty);

        let common = if all_equal {
            first_ty
        } else if arms.iter().all(|(value, _, _)| value.ty().is_numeric()) {
            if arms.iter().any(|(value, _, _)| value.ty() == IrType::F64) {
                IrType::F64
            } else {
                let bits = arms
                    .iter()
                    .filter_map(|(value, _, _)| value.ty().int_bits())
                    .max()
                    .unwrap_or(64);
                IrType::int_with_bits(bits)
            }
        } else {
            return_type_error!("{}: all branches must produce the same type", form);
        };

        if common == IrType::Void {
            return Ok(Value::zero_i64());
        }

        let mut incoming = Vec::with_capacity(arms.len());
        for (value, label, block) in arms {
            let widened = self.widen_in_block(block, value, &common);
            incoming.push((widened, label));
        }

        let result = self.new_reg();
        self.push_inst(Inst::Phi {
            result,
            ty: common.clone(),
            incoming,
        });

        Ok(Value::Reg {
            ty: common,
            id: result,
        })
    }

    /// `(if C1 B1 [C2 B2 ...] [elif Ck Bk ...] [else B])`: a chain of
    /// conditional branches falling through candidate to candidate. With an
    /// `else` present every surviving arm value is φ-merged; without one the
    /// form produces zero.
    pub(crate) fn gen_if(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("if chain with {} items", items.len());

        if items.len() < 3 {
            return_syntax_error!("if requires a condition and a block");
        }

        let merge_block = self.new_block("if.end");
        let mut branch_values: Vec<(Value, String, usize)> = Vec::new();

        let mut i = 1;

        // Leading condition/block pairs
        while i < items.len() {
            if items[i].is_symbol("elif") || items[i].is_symbol("else") {
                break;
            }

            if i + 1 >= items.len() {
                return_syntax_error!("if: missing block for condition");
            }

            let cond = self.gen(&items[i], env)?;
            let cond = self.to_condition(cond)?;

            let then_block = self.new_block("if.then");
            let next_block = self.new_block("if.next");

            self.terminate(Terminator::CondBr {
                cond,
                then_label: self.block_label(then_block),
                else_label: self.block_label(next_block),
            });

            self.set_insert(then_block);
            let value = self.gen(&items[i + 1], env)?;
            if !self.is_terminated() {
                branch_values.push((value, self.insert_label(), self.insert_index()));
                self.branch_to(merge_block);
            }

            self.set_insert(next_block);
            i += 2;
        }

        // elif chain and the final else
        let mut has_else = false;
        while i < items.len() {
            if items[i].is_symbol("elif") {
                if i + 2 >= items.len() {
                    return_syntax_error!("elif requires a condition and a block");
                }

                let cond = self.gen(&items[i + 1], env)?;
                let cond = self.to_condition(cond)?;

                let elif_block = self.new_block("elif.then");
                let next_block = self.new_block("elif.next");

                self.terminate(Terminator::CondBr {
                    cond,
                    then_label: self.block_label(elif_block),
                    else_label: self.block_label(next_block),
                });

                self.set_insert(elif_block);
                let value = self.gen(&items[i + 2], env)?;
                if !self.is_terminated() {
                    branch_values.push((value, self.insert_label(), self.insert_index()));
                    self.branch_to(merge_block);
                }

                self.set_insert(next_block);
                i += 3;
            } else if items[i].is_symbol("else") {
                if i + 1 >= items.len() {
                    return_syntax_error!("else requires a block");
                }

                // The else body compiles straight into the fall-through block
                let value = self.gen(&items[i + 1], env)?;
                if !self.is_terminated() {
                    branch_values.push((value, self.insert_label(), self.insert_index()));
                    self.branch_to(merge_block);
                }

                has_else = true;
                break;
            } else {
                return_syntax_error!("expected elif or else after if conditions");
            }
        }

        // Without an else the last fall-through block joins the merge empty-handed
        if !has_else && !self.is_terminated() {
            self.branch_to(merge_block);
        }

        self.set_insert(merge_block);

        if !has_else {
            return Ok(Value::zero_i64());
        }

        match branch_values.len() {
            0 => Ok(Value::zero_i64()),
            1 => Ok(branch_values
                .pop()
                .map(|(value, _, _)| value)
                .unwrap_or(Value::zero_i64())),
            _ => self.merge_branch_values(branch_values, "if"),
        }
    }

    /// `(loop E...)`: the body falls through to itself until a `break`.
    pub(crate) fn gen_infinite_loop(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("loop");

        let body_block = self.new_block("loop.body");
        let exit_block = self.new_block("loop.exit");

        self.branch_to(body_block);
        self.set_insert(body_block);

        self.loop_stack.push(LoopFrame {
            break_to: exit_block,
            continue_to: body_block,
        });

        for child in &items[1..] {
            self.gen(child, env)?;
        }

        if !self.is_terminated() {
            self.branch_to(body_block);
        }

        self.loop_stack.pop();
        self.set_insert(exit_block);

        Ok(Value::zero_i64())
    }

    /// `(while COND BODY)`: pre-test loop: cond, body, continue, break.
    pub(crate) fn gen_while(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("while loop");

        if items.len() != 3 {
            return_syntax_error!("while requires a condition and a body");
        }

        let cond_block = self.new_block("while.cond");
        let body_block = self.new_block("while.body");
        let continue_block = self.new_block("while.continue");
        let break_block = self.new_block("while.break");

        self.loop_stack.push(LoopFrame {
            break_to: break_block,
            continue_to: continue_block,
        });

        self.branch_to(cond_block);

        self.set_insert(cond_block);
        let cond = self.gen(&items[1], env)?;
        let cond = self.to_condition(cond)?;
        self.terminate(Terminator::CondBr {
            cond,
            then_label: self.block_label(body_block),
            else_label: self.block_label(break_block),
        });

        self.set_insert(body_block);
        self.gen(&items[2], env)?;
        if !self.is_terminated() {
            self.branch_to(continue_block);
        }

        self.set_insert(continue_block);
        self.branch_to(cond_block);

        self.loop_stack.pop();
        self.set_insert(break_block);

        Ok(Value::zero_i64())
    }

    /// `(for INIT COND STEP BODY)`: the init binds in a child scope so the
    /// induction variable stays local to the loop.
    pub(crate) fn gen_for(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("for loop");

        if items.len() != 5 {
            return_syntax_error!("for requires an init, a condition, a step and a body");
        }

        let for_env = Scope::make_child(env);

        self.gen(&items[1], &for_env)?;

        let cond_block = self.new_block("for.cond");
        let body_block = self.new_block("for.body");
        let step_block = self.new_block("for.step");
        let break_block = self.new_block("for.break");

        self.loop_stack.push(LoopFrame {
            break_to: break_block,
            continue_to: step_block,
        });

        self.branch_to(cond_block);

        self.set_insert(cond_block);
        let cond = self.gen(&items[2], &for_env)?;
        let cond = self.to_condition(cond)?;
        self.terminate(Terminator::CondBr {
            cond,
            then_label: self.block_label(body_block),
            else_label: self.block_label(break_block),
        });

        self.set_insert(body_block);
        self.gen(&items[4], &for_env)?;
        if !self.is_terminated() {
            self.branch_to(step_block);
        }

        self.set_insert(step_block);
        self.gen(&items[3], &for_env)?;
        if !self.is_terminated() {
            self.branch_to(cond_block);
        }

        self.loop_stack.pop();
        self.set_insert(break_block);

        Ok(Value::zero_i64())
    }

    /// `(break)` branches to the innermost loop's exit and opens a fresh
    /// unreachable block so trailing source code keeps a valid insertion
    /// point.
    pub(crate) fn gen_break(&mut self, items: &[AstNode]) -> Result<Value, CompileError> {
        if items.len() != 1 {
            return_syntax_error!("break takes no arguments");
        }

        let target = match self.loop_stack.last() {
            Some(frame) => frame.break_to,
            None => return_rule_error!("break outside of loop"),
        };

        self.branch_to(target);

        let after = self.new_block("after_break");
        self.set_insert(after);

        Ok(Value::zero_i64())
    }

    /// `(continue)`: same shape as `break`, branching to the loop's
    /// continue target.
    pub(crate) fn gen_continue(&mut self, items: &[AstNode]) -> Result<Value, CompileError> {
        if items.len() != 1 {
            return_syntax_error!("continue takes no arguments");
        }

        let target = match self.loop_stack.last() {
            Some(frame) => frame.continue_to,
            None => return_rule_error!("continue outside of loop"),
        };

        self.branch_to(target);

        let after = self.new_block("after_continue");
        self.set_insert(after);

        Ok(Value::zero_i64())
    }
}
