//! Operations a type exposes.
//!
//! Primitives carry a fixed set of operators. The built-in records expose
//! field reads (`c_str`, `name`, `type`). Classes and data types expose
//! the methods registered on them while their bodies were declared.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{BinaryOp, Name, StringInterner};

use crate::{Idx, Pool, Signature, TypeData};

/// A resolved operation on a receiver type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Integer arithmetic or shift; the result has the operand's type.
    Arith(BinaryOp),
    /// Comparison; the result is Boolean.
    Compare(BinaryOp),
    /// Read field `index` of the receiver struct.
    Element { index: u32, ret: Idx },
    /// A user method.
    Method(Signature),
}

impl Operation {
    /// Result type when applied to a receiver of type `operand`.
    pub fn result_type(&self, operand: Idx) -> Idx {
        match self {
            Operation::Arith(_) => operand,
            Operation::Compare(_) => Idx::BOOLEAN,
            Operation::Element { ret, .. } => *ret,
            Operation::Method(sig) => sig.ret,
        }
    }
}

fn binary_op_from_symbol(symbol: &str) -> Option<BinaryOp> {
    Some(match symbol {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        "<<" => BinaryOp::Shl,
        ">>" => BinaryOp::Shr,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        _ => return None,
    })
}

impl Pool {
    /// Built-in operator on a resolved type, if it has one.
    pub fn binary_operation(&self, ty: Idx, op: BinaryOp) -> Option<Operation> {
        match self.data(self.resolve(ty)) {
            TypeData::Integer => Some(if op.is_comparison() {
                Operation::Compare(op)
            } else {
                Operation::Arith(op)
            }),
            TypeData::Char if op.is_comparison() => Some(Operation::Compare(op)),
            TypeData::Boolean if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
                Some(Operation::Compare(op))
            }
            _ => None,
        }
    }

    /// Result type of `lhs op rhs`, both sides resolved.
    ///
    /// The right operand must have the left operand's type, with the usual
    /// Boolean to Integer widening.
    pub fn binary_result(
        &self,
        lhs: Idx,
        op: BinaryOp,
        rhs: Idx,
        interner: &StringInterner,
    ) -> CompileResult<Idx> {
        let Some(operation) = self.binary_operation(lhs, op) else {
            return Err(CompileError::unknown_operation(
                op.symbol(),
                self.display(lhs, interner),
            ));
        };
        if !self.can_convert(rhs, lhs) {
            return Err(CompileError::type_mismatch(format!(
                "no operation '{}' between '{}' and '{}'",
                op.symbol(),
                self.display(lhs, interner),
                self.display(rhs, interner),
            )));
        }
        Ok(operation.result_type(self.resolve(lhs)))
    }

    /// Look up operation `name` on `ty`.
    ///
    /// Operator names (`+`, `<`, ...) find built-in operators; other names
    /// find field reads on built-in records or registered methods.
    pub fn find_operation(
        &self,
        ty: Idx,
        name: Name,
        interner: &StringInterner,
    ) -> CompileResult<Operation> {
        let ty = self.resolve(ty);
        let text = interner.lookup(name);
        let found = match binary_op_from_symbol(text) {
            Some(op) => self.binary_operation(ty, op),
            None => self.named_operation(ty, name, text),
        };
        found.ok_or_else(|| CompileError::unknown_operation(text, self.display(ty, interner)))
    }

    fn named_operation(&self, ty: Idx, name: Name, text: &str) -> Option<Operation> {
        match (self.data(ty), text) {
            (TypeData::Str, "c_str") => Some(Operation::Element {
                index: 1,
                ret: self.char_pointer(),
            }),
            (TypeData::TypeRecord, "name") => Some(Operation::Element {
                index: 0,
                ret: Idx::STRING,
            }),
            (TypeData::Dynamic, "type") => Some(Operation::Element {
                index: 0,
                ret: Idx::TYPE,
            }),
            (TypeData::Reference(r), _) => r.methods.get(&name).cloned().map(Operation::Method),
            (TypeData::Data(d), _) => d.methods.get(&name).cloned().map(Operation::Method),
            _ => None,
        }
    }

    /// Argument and return types of callable `name` on `ty`, without
    /// generating anything.
    pub fn find_signature(
        &self,
        ty: Idx,
        name: Name,
        interner: &StringInterner,
    ) -> Option<Signature> {
        let ty = self.resolve(ty);
        match self.named_operation(ty, name, interner.lookup(name))? {
            Operation::Method(sig) => Some(sig),
            Operation::Element { ret, .. } => Some(Signature {
                name,
                link_name: name,
                params: Vec::new(),
                ret,
                varargs: false,
            }),
            Operation::Arith(_) | Operation::Compare(_) => None,
        }
    }
}
