//! `Code`: an ordered, well-formedness-checked sequence of instructions,
//! plus the splice/truncate/replace surface the mutation engine consumes.

use crate::context::Context;
use crate::error::{ILError, Result};
use crate::instruction::Instruction;
use crate::opcode::BlockKind;
use crate::variable::Variable;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Default)]
struct Frame {
    kind: Option<BlockKind>,
    opens_context: Context,
    vars: HashSet<Variable>,
}

/// An ordered sequence of instructions forming one program (or one fragment
/// spliced into another).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Code {
    instructions: Vec<Instruction>,
}

impl Code {
    pub fn new() -> Self {
        Code { instructions: Vec::new() }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// The context bitset active immediately before the instruction at
    /// `index` (useful for diagnostics and for context-monotonicity tests).
    pub fn context_before(&self, index: usize) -> Context {
        let mut stack = vec![Frame {
            kind: None,
            opens_context: Context::root(),
            vars: HashSet::new(),
        }];
        for inst in self.instructions.iter().take(index) {
            Self::advance(&mut stack, inst);
        }
        stack.iter().fold(Context::empty(), |acc, f| acc | f.opens_context)
    }

    fn advance(stack: &mut Vec<Frame>, inst: &Instruction) {
        let desc = inst.opcode.descriptor();
        if let Some(family) = desc.closes_family {
            if let Some(expected_kind) = desc.requires_surrounding_block_of_kind {
                if stack.last().and_then(|f| f.kind) == Some(expected_kind) {
                    stack.pop();
                }
            } else if stack.last().and_then(|f| f.kind).map(|k| k.family()) == Some(family) {
                stack.pop();
            }
        }
        if let Some(kind) = desc.opens_block {
            stack.push(Frame {
                kind: Some(kind),
                opens_context: desc.opens_context,
                vars: HashSet::new(),
            });
        }
    }

    /// Full well-formedness check.
    pub fn check(&self) -> Result<()> {
        let mut stack = vec![Frame {
            kind: None,
            opens_context: Context::root(),
            vars: HashSet::new(),
        }];
        let mut defined: HashSet<Variable> = HashSet::new();
        let mut in_scope: HashSet<Variable> = HashSet::new();

        for (index, inst) in self.instructions.iter().enumerate() {
            let desc = inst.opcode.descriptor();
            let current_context = stack.iter().fold(Context::empty(), |acc, f| acc | f.opens_context);

            if !desc.requires_context.is_empty() && !current_context.contains(desc.requires_context) {
                return Err(ILError::ContextViolation {
                    index,
                    opcode: inst.opcode,
                    required: desc.requires_context,
                    current: current_context,
                });
            }

            for &v in &inst.inputs {
                if !defined.contains(&v) {
                    return Err(ILError::UseBeforeDef { index, var: v });
                }
                if !in_scope.contains(&v) {
                    return Err(ILError::OutOfScope { index, var: v });
                }
            }

            if let Some(family) = desc.closes_family {
                let top_kind = stack.last().and_then(|f| f.kind);
                let matches = match desc.requires_surrounding_block_of_kind {
                    Some(expected) => top_kind == Some(expected),
                    None => top_kind.map(|k| k.family()) == Some(family),
                };
                if !matches {
                    if let Some(expected) = desc.requires_surrounding_block_of_kind {
                        return Err(ILError::WrongSurroundingBlock { index, opcode: inst.opcode, expected });
                    }
                    return Err(ILError::UnbalancedBlock {
                        index,
                        expected_family: top_kind.map(|k| k.family()),
                        found: inst.opcode,
                    });
                }
                if stack.len() == 1 {
                    return Err(ILError::UnmatchedCloser { index, opcode: inst.opcode });
                }
                let popped = stack.pop().unwrap();
                for v in popped.vars {
                    in_scope.remove(&v);
                }
            }

            for &v in &inst.outputs {
                if defined.contains(&v) {
                    return Err(ILError::DuplicateOutput { index, var: v });
                }
                defined.insert(v);
            }
            if let Some(top) = stack.last_mut() {
                for &v in &inst.outputs {
                    top.vars.insert(v);
                    in_scope.insert(v);
                }
            }

            if let Some(kind) = desc.opens_block {
                stack.push(Frame {
                    kind: Some(kind),
                    opens_context: desc.opens_context,
                    vars: HashSet::new(),
                });
            }

            for &v in &inst.inner_outputs {
                if defined.contains(&v) {
                    return Err(ILError::DuplicateOutput { index, var: v });
                }
                defined.insert(v);
            }
            if let Some(top) = stack.last_mut() {
                for &v in &inst.inner_outputs {
                    top.vars.insert(v);
                    in_scope.insert(v);
                }
            }
        }

        if stack.len() > 1 {
            return Err(ILError::UnclosedBlocks {
                index: self.instructions.len(),
                count: stack.len() - 1,
            });
        }
        Ok(())
    }

    // --- mutation-engine-facing surface ---

    /// Replace a single instruction in place. The caller (the mutation
    /// engine) is responsible for keeping variable numbering consistent;
    /// this does not re-run `check()`.
    pub fn replace_instruction(&mut self, index: usize, instruction: Instruction) {
        self.instructions[index] = instruction;
    }

    /// Splice `fragment`'s instructions into `self` at `cursor`, renumbering
    /// every variable the fragment defines and references by `offset` so the
    /// SSA definition invariant (every variable is defined exactly once)
    /// holds across the splice boundary. `offset` is normally the number of
    /// variables already allocated in `self`.
    pub fn splice_at(&mut self, cursor: usize, fragment: &Code, offset: u32) {
        let renumbered: Vec<Instruction> = fragment
            .instructions
            .iter()
            .map(|inst| {
                let mut inst = inst.clone();
                for v in inst.inputs.iter_mut() {
                    *v = Variable::new(v.index() + offset);
                }
                for v in inst.outputs.iter_mut() {
                    *v = Variable::new(v.index() + offset);
                }
                for v in inst.inner_outputs.iter_mut() {
                    *v = Variable::new(v.index() + offset);
                }
                inst
            })
            .collect();
        self.instructions.splice(cursor..cursor, renumbered);
    }

    /// Truncate at the nearest instruction boundary at or before `cursor`
    /// where the scope stack is back at its root depth — i.e. no block
    /// opened before the truncation point is left dangling open.
    pub fn truncate_at(&mut self, cursor: usize) {
        let mut stack = vec![Frame {
            kind: None,
            opens_context: Context::root(),
            vars: HashSet::new(),
        }];
        let mut last_safe_boundary = 0;
        for (index, inst) in self.instructions.iter().enumerate() {
            if index >= cursor {
                break;
            }
            Self::advance(&mut stack, inst);
            if stack.len() == 1 {
                last_safe_boundary = index + 1;
            }
        }
        self.instructions.truncate(last_safe_boundary);
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, inst) in self.instructions.iter().enumerate() {
            let outs: Vec<String> = inst.all_outputs().map(|v| v.to_string()).collect();
            let ins: Vec<String> = inst.inputs.iter().map(|v| v.to_string()).collect();
            if outs.is_empty() {
                writeln!(f, "{:>4}: {:?} {:?}", index, inst.opcode, ins)?;
            } else {
                writeln!(f, "{:>4}: {} <- {:?} {:?}", index, outs.join(","), inst.opcode, ins)?;
            }
        }
        Ok(())
    }
}

impl IntoIterator for Code {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;
    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Code {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;
    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Parameters;
    use crate::opcode::Opcode;

    fn load_int(out: u32) -> Instruction {
        Instruction::new(Opcode::LoadInt, vec![], vec![Variable::new(out)], vec![], Parameters::Int(1))
    }

    #[test]
    fn balanced_if_else_passes_check() {
        let mut code = Code::new();
        code.push(load_int(0));
        code.push(Instruction::new(Opcode::BeginIf, vec![Variable::new(0)], vec![], vec![], Parameters::None));
        code.push(load_int(1));
        code.push(Instruction::new(Opcode::BeginElse, vec![], vec![], vec![], Parameters::None));
        code.push(load_int(2));
        code.push(Instruction::new(Opcode::EndIf, vec![], vec![], vec![], Parameters::None));
        assert!(code.check().is_ok());
    }

    #[test]
    fn reference_after_scope_closes_is_rejected() {
        let mut code = Code::new();
        code.push(Instruction::new(
            Opcode::BeginPlainFunction,
            vec![],
            vec![Variable::new(0)],
            vec![Variable::new(1)],
            Parameters::ArgumentCount(1),
        ));
        code.push(Instruction::new(Opcode::EndPlainFunction, vec![], vec![], vec![], Parameters::None));
        // reference to the inner parameter v1 after the function closed
        code.push(Instruction::new(Opcode::GetProperty, vec![Variable::new(1)], vec![Variable::new(2)], vec![], Parameters::PropertyName(crate::symbol::Symbol::intern("x"))));
        assert!(matches!(code.check(), Err(ILError::OutOfScope { .. })));
    }

    #[test]
    fn unmatched_closer_is_rejected() {
        let mut code = Code::new();
        code.push(Instruction::new(Opcode::EndIf, vec![], vec![], vec![], Parameters::None));
        assert!(matches!(code.check(), Err(ILError::UnmatchedCloser { .. })));
    }

    #[test]
    fn dangling_open_block_is_rejected() {
        let mut code = Code::new();
        code.push(Instruction::new(Opcode::BeginIf, vec![], vec![], vec![], Parameters::None));
        assert!(matches!(code.check(), Err(ILError::UseBeforeDef { .. }) | Err(ILError::UnclosedBlocks { .. })));
    }

    #[test]
    fn duplicate_output_is_rejected() {
        let mut code = Code::new();
        code.push(load_int(0));
        code.push(load_int(0));
        assert!(matches!(code.check(), Err(ILError::DuplicateOutput { .. })));
    }

    #[test]
    fn splice_renumbers_fragment_variables() {
        let mut fragment = Code::new();
        fragment.push(load_int(0));
        let mut target = Code::new();
        target.push(load_int(0));
        target.splice_at(1, &fragment, 1);
        assert_eq!(target.len(), 2);
        assert_eq!(target.get(1).unwrap().outputs[0], Variable::new(1));
        assert!(target.check().is_ok());
    }

    #[test]
    fn truncate_preserves_block_balance() {
        let mut code = Code::new();
        code.push(load_int(0));
        code.push(Instruction::new(Opcode::BeginIf, vec![Variable::new(0)], vec![], vec![], Parameters::None));
        code.push(load_int(1));
        code.push(Instruction::new(Opcode::EndIf, vec![], vec![], vec![], Parameters::None));
        code.truncate_at(2); // cursor inside the open If block
        assert!(code.check().is_ok());
        assert_eq!(code.len(), 1);
    }
}
