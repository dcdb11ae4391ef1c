//! The builder's scope stack. Each frame holds the variables defined since
//! it was opened, the context bits it contributes, and (for block-closing
//! matching) its [`BlockKind`].

use fuzzil_ir::{BlockKind, Context, Variable};

#[derive(Debug)]
pub(crate) struct Frame {
    pub kind: Option<BlockKind>,
    pub opens_context: Context,
    pub vars: Vec<Variable>,
}

/// The builder's nested scope stack. The bottom frame is the implicit root
/// context; every other frame was pushed by a block-opening instruction and
/// popped by its matching closer.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame {
                kind: None,
                opens_context: Context::root(),
                vars: Vec::new(),
            }],
        }
    }

    pub fn push(&mut self, kind: BlockKind, opens_context: Context) {
        self.frames.push(Frame { kind: Some(kind), opens_context, vars: Vec::new() });
    }

    /// Pops the innermost frame. Its variables leave scope but are never
    /// forgotten by the builder's dense type map.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_kind(&self) -> Option<BlockKind> {
        self.frames.last().and_then(|f| f.kind)
    }

    /// The context bitset at the cursor: the OR of every open frame's
    /// `opens_context`.
    pub fn current_context(&self) -> Context {
        self.frames.iter().fold(Context::empty(), |acc, f| acc | f.opens_context)
    }

    pub fn declare(&mut self, v: Variable) {
        self.frames.last_mut().expect("root frame always present").vars.push(v);
    }

    /// Every variable visible at the cursor: the union of all open frames'
    /// variables.
    pub fn visible_vars(&self) -> impl Iterator<Item = Variable> + '_ {
        self.frames.iter().flat_map(|f| f.vars.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_var_visible_after_push() {
        let mut stack = ScopeStack::new();
        stack.push(BlockKind::PlainFunction, Context::SUBROUTINE);
        stack.declare(Variable::new(0));
        assert_eq!(stack.visible_vars().collect::<Vec<_>>(), vec![Variable::new(0)]);
    }

    #[test]
    fn var_not_visible_after_pop() {
        let mut stack = ScopeStack::new();
        stack.push(BlockKind::PlainFunction, Context::SUBROUTINE);
        stack.declare(Variable::new(0));
        stack.pop();
        assert!(stack.visible_vars().next().is_none());
    }

    #[test]
    fn outer_vars_remain_visible_in_nested_scope() {
        let mut stack = ScopeStack::new();
        stack.declare(Variable::new(0));
        stack.push(BlockKind::IfThen, Context::empty());
        stack.declare(Variable::new(1));
        let visible: Vec<_> = stack.visible_vars().collect();
        assert_eq!(visible, vec![Variable::new(0), Variable::new(1)]);
    }

    #[test]
    fn root_frame_cannot_be_popped() {
        let mut stack = ScopeStack::new();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn context_accumulates_across_nested_opens() {
        let mut stack = ScopeStack::new();
        stack.push(BlockKind::PlainFunction, Context::SUBROUTINE);
        stack.push(BlockKind::ForLoop, Context::LOOP);
        let ctx = stack.current_context();
        assert!(ctx.contains(Context::JAVASCRIPT));
        assert!(ctx.contains(Context::SUBROUTINE));
        assert!(ctx.contains(Context::LOOP));
    }
}
