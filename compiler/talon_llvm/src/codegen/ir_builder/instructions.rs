//! Arithmetic, comparison, conversion, call and phi instructions.

use inkwell::basic_block::BasicBlock;
use inkwell::values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, IntValue};
use inkwell::IntPredicate;

use super::{FunctionSig, IrBuilder};
use crate::codegen::value_id::{BlockId, FunctionId, LLVMTypeId, ValueId};

impl<'ctx> IrBuilder<'ctx> {
    // -----------------------------------------------------------------------
    // Arithmetic
    // -----------------------------------------------------------------------

    /// Both operands as ints, or `None` after recording a codegen error.
    fn int_operands(&self, lhs: ValueId, rhs: ValueId, op: &str) -> Option<(IntValue<'ctx>, IntValue<'ctx>)> {
        let l = self.arena.get_value(lhs);
        let r = self.arena.get_value(rhs);
        if l.is_int_value() && r.is_int_value() {
            return Some((l.into_int_value(), r.into_int_value()));
        }
        tracing::error!(op, lhs = ?l.get_type(), rhs = ?r.get_type(), "integer op on non-int operands");
        self.record_codegen_error();
        None
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "add") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_int_add(l, r, name).expect("add");
        self.arena.push_value(v.into())
    }

    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "sub") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_int_sub(l, r, name).expect("sub");
        self.arena.push_value(v.into())
    }

    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "mul") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_int_mul(l, r, name).expect("mul");
        self.arena.push_value(v.into())
    }

    pub fn sdiv(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "sdiv") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_int_signed_div(l, r, name).expect("sdiv");
        self.arena.push_value(v.into())
    }

    pub fn srem(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "srem") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_int_signed_rem(l, r, name).expect("srem");
        self.arena.push_value(v.into())
    }

    pub fn shl(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "shl") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_left_shift(l, r, name).expect("shl");
        self.arena.push_value(v.into())
    }

    /// Arithmetic (sign-extending) right shift.
    pub fn ashr(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "ashr") else {
            return self.const_i32(0);
        };
        let v = self.builder.build_right_shift(l, r, true, name).expect("ashr");
        self.arena.push_value(v.into())
    }

    /// Logical not of an `i1`.
    pub fn not(&mut self, val: ValueId, name: &str) -> ValueId {
        let raw = self.arena.get_value(val);
        if !raw.is_int_value() {
            tracing::error!(val_type = ?raw.get_type(), "not on non-int");
            self.record_codegen_error();
            return self.const_bool(false);
        }
        let v = self
            .builder
            .build_not(raw.into_int_value(), name)
            .expect("not");
        self.arena.push_value(v.into())
    }

    // -----------------------------------------------------------------------
    // Comparisons
    // -----------------------------------------------------------------------

    /// Integer comparison producing an `i1`.
    pub fn icmp(&mut self, pred: IntPredicate, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let Some((l, r)) = self.int_operands(lhs, rhs, "icmp") else {
            return self.const_bool(false);
        };
        let v = self
            .builder
            .build_int_compare(pred, l, r, name)
            .expect("icmp");
        self.arena.push_value(v.into())
    }

    /// Pointer comparison producing an `i1`.
    pub fn icmp_ptr(&mut self, pred: IntPredicate, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let l = self.arena.get_value(lhs);
        let r = self.arena.get_value(rhs);
        if !l.is_pointer_value() || !r.is_pointer_value() {
            tracing::error!(lhs = ?l.get_type(), rhs = ?r.get_type(), "icmp_ptr on non-pointer");
            self.record_codegen_error();
            return self.const_bool(false);
        }
        let v = self
            .builder
            .build_int_compare(pred, l.into_pointer_value(), r.into_pointer_value(), name)
            .expect("icmp_ptr");
        self.arena.push_value(v.into())
    }

    // -----------------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------------

    pub fn zext(&mut self, val: ValueId, to: LLVMTypeId, name: &str) -> ValueId {
        let raw = self.arena.get_value(val);
        let target = self.arena.get_type(to);
        if !raw.is_int_value() || !target.is_int_type() {
            tracing::error!(val_type = ?raw.get_type(), ?target, "zext on non-int");
            self.record_codegen_error();
            return val;
        }
        let v = self
            .builder
            .build_int_z_extend(raw.into_int_value(), target.into_int_type(), name)
            .expect("zext");
        self.arena.push_value(v.into())
    }

    pub fn bitcast(&mut self, val: ValueId, to: LLVMTypeId, name: &str) -> ValueId {
        let raw = self.arena.get_value(val);
        let target = self.arena.get_type(to);
        let v = self
            .builder
            .build_bit_cast(raw, target, name)
            .expect("bitcast");
        self.arena.push_value(v)
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    fn call_args(&self, args: &[ValueId]) -> Vec<BasicMetadataValueEnum<'ctx>> {
        args.iter().map(|&id| self.arena.get_value(id).into()).collect()
    }

    /// Call `callee` directly. Returns `None` for void callees.
    pub fn call(&mut self, callee: FunctionId, args: &[ValueId], name: &str) -> Option<ValueId> {
        let func = self.arena.get_function(callee);
        let arg_vals = self.call_args(args);
        // Void results cannot carry a name.
        let name = if func.get_type().get_return_type().is_none() { "" } else { name };
        let call_val = self
            .builder
            .build_call(func, &arg_vals, name)
            .expect("call");
        call_val
            .try_as_basic_value()
            .basic()
            .map(|v| self.arena.push_value(v))
    }

    /// Call through the function pointer `fn_ptr`, whose callee has
    /// signature `sig`. Returns `None` for void callees.
    pub fn call_indirect(
        &mut self,
        sig: &FunctionSig,
        fn_ptr: ValueId,
        args: &[ValueId],
        name: &str,
    ) -> Option<ValueId> {
        let raw = self.arena.get_value(fn_ptr);
        if !raw.is_pointer_value() {
            tracing::error!(val_type = ?raw.get_type(), "call_indirect on non-pointer");
            self.record_codegen_error();
            return None;
        }
        let func_ty = self.fn_type(sig);
        let arg_vals = self.call_args(args);
        let name = if sig.ret.is_none() { "" } else { name };
        let call_val = self
            .builder
            .build_indirect_call(func_ty, raw.into_pointer_value(), &arg_vals, name)
            .expect("call_indirect");
        call_val
            .try_as_basic_value()
            .basic()
            .map(|v| self.arena.push_value(v))
    }

    // -----------------------------------------------------------------------
    // Phi nodes
    // -----------------------------------------------------------------------

    /// Merge `incoming` values at the insertion point.
    ///
    /// - 0 incoming: `None`
    /// - 1 incoming: the value itself, no phi
    /// - more: a phi of type `ty`
    pub fn phi_from_incoming(
        &mut self,
        ty: LLVMTypeId,
        incoming: &[(ValueId, BlockId)],
        name: &str,
    ) -> Option<ValueId> {
        match incoming {
            [] => None,
            [(single, _)] => Some(*single),
            _ => {
                let llvm_ty = self.arena.get_type(ty);
                let phi = self.builder.build_phi(llvm_ty, name).expect("phi");
                let vals: Vec<BasicValueEnum<'ctx>> = incoming
                    .iter()
                    .map(|&(v, _)| self.arena.get_value(v))
                    .collect();
                let blocks: Vec<BasicBlock<'ctx>> = incoming
                    .iter()
                    .map(|&(_, b)| self.arena.get_block(b))
                    .collect();
                let refs: Vec<(&dyn BasicValue<'ctx>, BasicBlock<'ctx>)> = vals
                    .iter()
                    .zip(&blocks)
                    .map(|(v, &b)| (v as &dyn BasicValue<'ctx>, b))
                    .collect();
                phi.add_incoming(&refs);
                Some(self.arena.push_value(phi.as_basic_value()))
            }
        }
    }
}
