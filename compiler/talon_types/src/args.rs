//! Matching call arguments to declared parameters.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, StringInterner};

use crate::Signature;

/// Call arguments in declared parameter order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedArgs<T> {
    /// One argument per declared parameter.
    pub fixed: Vec<T>,
    /// Extra arguments passed to a variadic target, in call order.
    pub extra: Vec<T>,
}

/// Reorder `args` (each optionally named) into `sig`'s parameter order.
///
/// Positional arguments fill parameters left to right, then named
/// arguments fill the parameter carrying their name. A positional argument
/// after a named one, an unknown name, or a name given twice is a
/// [`CompileError::BadCall`]; a count that does not match the declaration
/// (more is allowed only for variadic targets) is a
/// [`CompileError::MissingArguments`].
pub fn order_arguments<T: Copy>(
    sig: &Signature,
    args: &[(Option<Name>, T)],
    interner: &StringInterner,
) -> CompileResult<OrderedArgs<T>> {
    let function = interner.lookup(sig.name);
    let needed = sig.arity();
    let given = args.len();
    if given < needed || (given > needed && !sig.varargs) {
        return Err(CompileError::missing_arguments(function, needed, given));
    }

    let mut slots: Vec<Option<T>> = vec![None; needed];
    let mut extra = Vec::new();
    let mut seen_named = false;
    let mut position = 0;

    for &(name, value) in args {
        match name {
            None if seen_named => {
                return Err(CompileError::bad_call(format!(
                    "positional argument after named argument in call to '{function}'"
                )));
            }
            None => {
                if position < needed {
                    slots[position] = Some(value);
                } else {
                    extra.push(value);
                }
                position += 1;
            }
            Some(name) => {
                seen_named = true;
                let Some(slot) = sig.params.iter().position(|p| p.name == Some(name)) else {
                    return Err(CompileError::bad_call(format!(
                        "'{function}' has no argument named '{}'",
                        interner.lookup(name)
                    )));
                };
                if slots[slot].is_some() {
                    return Err(CompileError::bad_call(format!(
                        "argument '{}' passed twice to '{function}'",
                        interner.lookup(name)
                    )));
                }
                slots[slot] = Some(value);
            }
        }
    }

    let fixed: Option<Vec<T>> = slots.into_iter().collect();
    match fixed {
        Some(fixed) => Ok(OrderedArgs { fixed, extra }),
        None => Err(CompileError::missing_arguments(function, needed, given)),
    }
}
