//! Terminators for `IrBuilder`.

use super::IrBuilder;
use crate::codegen::value_id::{BlockId, ValueId};

impl IrBuilder<'_> {
    /// True if a terminator may be added at the insertion point.
    ///
    /// Terminating a block twice, or with no block open, records a codegen
    /// error and leaves the block unchanged.
    fn can_terminate(&self, what: &str) -> bool {
        let Some(block) = self.current_block else {
            tracing::error!(what, "terminator emitted without an insertion point");
            self.record_codegen_error();
            return false;
        };
        let bb = self.arena.get_block(block);
        if bb.get_terminator().is_some() {
            tracing::error!(what, block = ?bb.get_name(), "block terminated twice");
            self.record_codegen_error();
            return false;
        }
        true
    }

    pub fn br(&mut self, dest: BlockId) {
        if !self.can_terminate("br") {
            return;
        }
        let bb = self.arena.get_block(dest);
        self.builder
            .build_unconditional_branch(bb)
            .expect("build_br");
    }

    /// Defensive: a non-int `cond` records an error and branches to `else_bb`.
    pub fn cond_br(&mut self, cond: ValueId, then_bb: BlockId, else_bb: BlockId) {
        if !self.can_terminate("cond_br") {
            return;
        }
        let raw = self.arena.get_value(cond);
        if !raw.is_int_value() {
            tracing::error!(val_type = ?raw.get_type(), "cond_br on non-int");
            self.record_codegen_error();
            self.br(else_bb);
            return;
        }
        let then_block = self.arena.get_block(then_bb);
        let else_block = self.arena.get_block(else_bb);
        self.builder
            .build_conditional_branch(raw.into_int_value(), then_block, else_block)
            .expect("build_cond_br");
    }

    pub fn ret(&mut self, val: ValueId) {
        if !self.can_terminate("ret") {
            return;
        }
        let v = self.arena.get_value(val);
        self.builder.build_return(Some(&v)).expect("build_ret");
    }

    pub fn ret_void(&mut self) {
        if !self.can_terminate("ret_void") {
            return;
        }
        self.builder.build_return(None).expect("build_ret_void");
    }

    pub fn unreachable(&mut self) {
        if !self.can_terminate("unreachable") {
            return;
        }
        self.builder.build_unreachable().expect("build_unreachable");
    }
}
