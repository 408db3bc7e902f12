//! Sequences, conditionals, loops, `case` and `return`.
//!
//! `if`, `while` and `case` are statements; none of them produces a value.
//! A block that ends in `return` is left terminated and the statements
//! after it are not generated.

use std::mem;

use inkwell::IntPredicate;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};
use talon_types::Idx;

use super::function_visitor::FunctionVisitor;
use super::value_id::{BlockId, ValueId};

impl FunctionVisitor<'_, '_, '_> {
    // -----------------------------------------------------------------------
    // Sequences
    // -----------------------------------------------------------------------

    pub(crate) fn lower_seq(&mut self, stmts: &[NodeId]) -> CompileResult<Option<ValueId>> {
        let mut last = None;
        for &stmt in stmts {
            if self.terminated() {
                break;
            }
            last = self.lower(stmt)?;
        }
        Ok(last)
    }

    /// An `i1` for a Boolean or Integer condition.
    fn condition(&mut self, cond: NodeId) -> CompileResult<ValueId> {
        let ty = self.type_of(cond)?;
        let value = self.lower_value(cond)?;
        if ty == Idx::INTEGER {
            let builder = &mut self.gen.cx.builder;
            let zero = builder.const_i32(0);
            return Ok(builder.icmp(IntPredicate::NE, value, zero, "tobool"));
        }
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // If / while
    // -----------------------------------------------------------------------

    pub(crate) fn lower_if(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> CompileResult<()> {
        let cond = self.condition(cond)?;
        let then_bb = self.block("if.then");
        let mut merge = None;
        let else_bb = match else_branch {
            Some(_) => self.block("if.else"),
            None => *merge.insert(self.block("if.end")),
        };
        self.gen.cx.builder.cond_br(cond, then_bb, else_bb);

        self.gen.cx.builder.position_at_end(then_bb);
        self.lower(then_branch)?;
        self.branch_to_merge(&mut merge);

        if let Some(else_branch) = else_branch {
            self.gen.cx.builder.position_at_end(else_bb);
            self.lower(else_branch)?;
            self.branch_to_merge(&mut merge);
        }

        // Without a merge block both branches returned and the builder
        // stays on a terminated block.
        if let Some(merge) = merge {
            self.gen.cx.builder.move_block_to_end(merge);
            self.gen.cx.builder.position_at_end(merge);
        }
        Ok(())
    }

    /// Branch to the merge block, creating it on first use, unless the
    /// current block already ended.
    fn branch_to_merge(&mut self, merge: &mut Option<BlockId>) {
        if self.terminated() {
            return;
        }
        let target = match *merge {
            Some(block) => block,
            None => *merge.insert(self.block("if.end")),
        };
        self.gen.cx.builder.br(target);
    }

    pub(crate) fn lower_while(&mut self, cond: NodeId, body: NodeId) -> CompileResult<()> {
        let cond_bb = self.block("while.cond");
        let body_bb = self.block("while.body");
        let end_bb = self.block("while.end");
        self.gen.cx.builder.br(cond_bb);

        self.gen.cx.builder.position_at_end(cond_bb);
        let cond = self.condition(cond)?;
        self.gen.cx.builder.cond_br(cond, body_bb, end_bb);

        self.gen.cx.builder.position_at_end(body_bb);
        self.lower(body)?;
        if !self.terminated() {
            self.gen.cx.builder.br(cond_bb);
        }

        self.gen.cx.builder.move_block_to_end(end_bb);
        self.gen.cx.builder.position_at_end(end_bb);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Case
    // -----------------------------------------------------------------------

    /// A chain of tests, one per `when`, falling through to `case.end`.
    ///
    /// Data values are tested by the tag in their envelope, `Dynamic`
    /// values by the address of the boxed type's runtime record. Pattern
    /// bindings live in a child scope of the arm.
    pub(crate) fn lower_case(&mut self, cond: NodeId, whens: &[NodeId]) -> CompileResult<()> {
        let tree = self.gen.tree;
        let cond_ty = self.type_of(cond)?;
        let value = self.lower_value(cond)?;
        let dynamic = cond_ty == Idx::DYNAMIC;
        let tag = if dynamic {
            None
        } else {
            let envelope = self.gen.layout(cond_ty)?;
            let builder = &mut self.gen.cx.builder;
            let i32_ty = builder.i32_type();
            let tag_slot = builder.struct_gep(envelope, value, 0, "tag.ptr");
            Some(builder.load(i32_ty, tag_slot, "tag"))
        };
        let end = self.block("case.end");

        for &when in whens {
            let NodeKind::When { pattern, body } = tree.kind(when) else {
                return Err(CompileError::internal("case arm is not a 'when'"));
            };
            let NodeKind::Pattern { binder, fields, .. } = tree.kind(*pattern) else {
                return Err(CompileError::internal("'when' without a pattern"));
            };
            let pattern_ty = self.type_of(*pattern)?;

            let matches = match tag {
                Some(tag) => self.tag_matches(tag, pattern_ty)?,
                None => self.dynamic_holds(value, pattern_ty)?,
            };
            let arm = self.block("when");
            let next = self.block("when.next");
            self.gen.cx.builder.cond_br(matches, arm, next);

            self.gen.cx.builder.position_at_end(arm);
            let child = self.scope.child();
            let outer = mem::replace(&mut self.scope, child);
            let lowered = self.bind_pattern(value, pattern_ty, dynamic, *binder, fields);
            let lowered = lowered.and_then(|()| self.lower(*body));
            self.scope = outer;
            lowered?;
            if !self.terminated() {
                self.gen.cx.builder.br(end);
            }

            self.gen.cx.builder.position_at_end(next);
        }

        // No arm matched.
        self.gen.cx.builder.br(end);
        self.gen.cx.builder.move_block_to_end(end);
        self.gen.cx.builder.position_at_end(end);
        Ok(())
    }

    fn tag_matches(&mut self, tag: ValueId, case: Idx) -> CompileResult<ValueId> {
        let pool = self.gen.pool;
        let case_type = pool.case_type(case).ok_or_else(|| {
            CompileError::internal(format!("'{}' is not a data case", self.gen.show(case)))
        })?;
        let expected = i32::try_from(case_type.tag)
            .map_err(|_| CompileError::internal("case tag overflows i32"))?;
        let name = format!("is.{}", self.gen.text(case_type.short_name));
        let builder = &mut self.gen.cx.builder;
        let expected = builder.const_i32(expected);
        Ok(builder.icmp(IntPredicate::EQ, tag, expected, &name))
    }

    /// Bind the binder and field names of a matched pattern.
    fn bind_pattern(
        &mut self,
        value: ValueId,
        pattern_ty: Idx,
        dynamic: bool,
        binder: Option<Name>,
        fields: &[Name],
    ) -> CompileResult<()> {
        if dynamic {
            if let Some(binder) = binder {
                let payload = self.unbox_dynamic(value, pattern_ty)?;
                self.scope.bind_immutable(binder, payload);
            }
            return Ok(());
        }

        if let Some(binder) = binder {
            self.scope.bind_immutable(binder, value);
        }
        if fields.is_empty() {
            return Ok(());
        }
        let pool = self.gen.pool;
        let case_type = pool
            .case_type(pattern_ty)
            .ok_or_else(|| CompileError::internal("data pattern is not a case"))?;
        let layout = self.gen.layout(pattern_ty)?;
        for (index, (&field, &(_, ty))) in fields.iter().zip(&case_type.fields).enumerate() {
            let value_ty = self.gen.value_type(ty)?;
            let text = self.gen.text(field);
            let index = u32::try_from(index + 1)
                .map_err(|_| CompileError::internal("case field index overflows u32"))?;
            let builder = &mut self.gen.cx.builder;
            let slot = builder.struct_gep(layout, value, index, &format!("{text}.ptr"));
            let loaded = builder.load(value_ty, slot, text);
            self.scope.bind_immutable(field, loaded);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Return
    // -----------------------------------------------------------------------

    pub(crate) fn lower_return(&mut self, value: Option<NodeId>) -> CompileResult<()> {
        match value {
            None => {
                self.return_void();
                Ok(())
            }
            Some(_) if self.returns_void() => Err(CompileError::internal(
                "value returned from a void function",
            )),
            Some(value) => {
                let ty = self.type_of(value)?;
                let v = self.lower_value(value)?;
                if self.terminated() {
                    return Ok(());
                }
                self.add_return_site(v, ty)
            }
        }
    }
}
