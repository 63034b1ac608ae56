//! Module verifier
//!
//! Structural checks run after codegen and before the module is written out.
//! None of these should ever fire on user input; a failure here is a codegen
//! bug, so everything reports as a compiler error.
//!
//! Checked invariants:
//! - every basic block has exactly one terminator
//! - every branch targets a block that exists in the same function
//! - φ-nodes come before any other instruction in their block
//! - a φ-node's incoming labels are exactly the block's predecessors
//! - φ incoming value types agree with the φ's own type

use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::ir::nodes::{Inst, IrFunction, IrModule, Terminator};
use crate::return_compiler_error;
use rustc_hash::{FxHashMap, FxHashSet};

pub fn verify_module(module: &IrModule) -> Result<(), CompileError> {
    let mut seen_names = FxHashSet::default();
    for func in &module.functions {
        if !seen_names.insert(func.name.as_str()) {
            return_compiler_error!("Duplicate function definition \"{}\"", func.name);
        }
        verify_function(func)?;
    }

    Ok(())
}

fn verify_function(func: &IrFunction) -> Result<(), CompileError> {
    if func.blocks.is_empty() {
        return_compiler_error!("Function \"{}\" has no blocks", func.name);
    }

    let labels: FxHashSet<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();

    // Predecessor sets, derived from the terminators
    let mut preds: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();

    for block in &func.blocks {
        let term = match &block.terminator {
            Some(term) => term,
            None => {
                return_compiler_error!(
                    "Block \"{}\" in function \"{}\" has no terminator",
                    block.label,
                    func.name
                )
            }
        };

        let mut targets: Vec<&str> = Vec::new();
        match term {
            Terminator::Br { target } => targets.push(target),
            Terminator::CondBr {
                then_label,
                else_label,
                ..
            } => {
                targets.push(then_label);
                targets.push(else_label);
            }
            Terminator::Ret { .. } => {}
        }

        for target in targets {
            if !labels.contains(target) {
                return_compiler_error!(
                    "Block \"{}\" in function \"{}\" branches to unknown block \"{}\"",
                    block.label,
                    func.name,
                    target
                );
            }
            preds.entry(target).or_default().insert(&block.label);
        }
    }

    for block in &func.blocks {
        let mut past_leading_phis = false;

        for inst in &block.instructions {
            let phi = match inst {
                Inst::Phi { ty, incoming, .. } => {
                    if past_leading_phis {
                        return_compiler_error!(
                            "phi after a non-phi instruction in block \"{}\" of \"{}\"",
                            block.label,
                            func.name
                        );
                    }
                    Some((ty, incoming))
                }
                _ => {
                    past_leading_phis = true;
                    None
                }
            };

            let Some((phi_ty, incoming)) = phi else {
                continue;
            };

            let empty = FxHashSet::default();
            let block_preds = preds.get(block.label.as_str()).unwrap_or(&empty);

            let incoming_labels: FxHashSet<&str> =
                incoming.iter().map(|(_, label)| label.as_str()).collect();

            if incoming_labels != *block_preds || incoming.len() != block_preds.len() {
                return_compiler_error!(
                    "phi in block \"{}\" of \"{}\" does not match its predecessors",
                    block.label,
                    func.name
                );
            }

            for (value, _) in incoming {
                if value.ty() != *phi_ty {
                    return_compiler_error!(
                        "phi in block \"{}\" of \"{}\" mixes value types",
                        block.label,
                        func.name
                    );
                }
            }
        }
    }

    Ok(())
}
