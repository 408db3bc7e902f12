//! Binary and unary operators.

use inkwell::IntPredicate;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{BinaryOp, NodeId, NodeKind, UnaryOp};
use talon_types::Operation;

use super::function_visitor::FunctionVisitor;
use super::ir_builder::IrBuilder;
use super::value_id::ValueId;

/// Build the integer instruction for an arithmetic operator.
fn build_arith(
    builder: &mut IrBuilder<'_>,
    op: BinaryOp,
    l: ValueId,
    r: ValueId,
) -> Option<ValueId> {
    Some(match op {
        BinaryOp::Add => builder.add(l, r, "add"),
        BinaryOp::Sub => builder.sub(l, r, "sub"),
        BinaryOp::Mul => builder.mul(l, r, "mul"),
        BinaryOp::Div => builder.sdiv(l, r, "sdiv"),
        BinaryOp::Rem => builder.srem(l, r, "srem"),
        BinaryOp::Shl => builder.shl(l, r, "shl"),
        BinaryOp::Shr => builder.ashr(l, r, "ashr"),
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne => return None,
    })
}

fn predicate(op: BinaryOp) -> Option<IntPredicate> {
    Some(match op {
        BinaryOp::Lt => IntPredicate::SLT,
        BinaryOp::Gt => IntPredicate::SGT,
        BinaryOp::Le => IntPredicate::SLE,
        BinaryOp::Ge => IntPredicate::SGE,
        BinaryOp::Eq => IntPredicate::EQ,
        BinaryOp::Ne => IntPredicate::NE,
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Rem
        | BinaryOp::Shl
        | BinaryOp::Shr => return None,
    })
}

impl FunctionVisitor<'_, '_, '_> {
    /// `lhs op rhs`. The right operand is converted to the left operand's
    /// type first, which widens a Boolean to an Integer.
    pub(crate) fn lower_binary(
        &mut self,
        node: NodeId,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> CompileResult<ValueId> {
        let lhs_ty = self.type_of(lhs)?;
        let rhs_ty = self.type_of(rhs)?;
        let l = self.lower_value(lhs)?;
        let r = self.lower_value(rhs)?;
        let r = self.convert(r, rhs_ty, lhs_ty)?;

        let operation = self.gen.pool.binary_operation(lhs_ty, op).ok_or_else(|| {
            CompileError::unknown_operation(op.symbol(), self.gen.show(lhs_ty))
        })?;
        let builder = &mut self.gen.cx.builder;
        match operation {
            Operation::Arith(op) => {
                build_arith(builder, op, l, r)
                    .ok_or_else(|| CompileError::internal("comparison used as arithmetic"))
            }
            Operation::Compare(op) => {
                let pred = predicate(op)
                    .ok_or_else(|| CompileError::internal("arithmetic used as comparison"))?;
                Ok(builder.icmp(pred, l, r, "cmp"))
            }
            Operation::Element { .. } | Operation::Method(_) => Err(CompileError::internal(
                format!("operator at node {} resolved to a method", node.raw()),
            )),
        }
    }

    pub(crate) fn lower_unary(&mut self, op: UnaryOp, operand: NodeId) -> CompileResult<ValueId> {
        match op {
            UnaryOp::Not => {
                let value = self.lower_value(operand)?;
                Ok(self.gen.cx.builder.not(value, "not"))
            }
            UnaryOp::Stack => {
                let tree = self.gen.tree;
                match tree.kind(operand) {
                    NodeKind::Call { args, .. } | NodeKind::TemplatedInstance { args, .. } => {
                        self.lower_construction(operand, args, true)
                    }
                    _ => Err(CompileError::type_mismatch(
                        "'~' must be applied to a construction",
                    )),
                }
            }
        }
    }
}
