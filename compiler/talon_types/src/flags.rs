//! Per-type properties computed when a type enters the pool.

use bitflags::bitflags;

bitflags! {
    /// Cached classification of a pool entry.
    ///
    /// Flags describe the entry itself; a type variable only carries
    /// `IS_VAR` and must be resolved before asking about representation.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u16 {
        /// Integer, Boolean, Char or Void.
        const IS_PRIMITIVE = 1 << 0;
        /// Values are passed as a pointer to a struct.
        const BY_POINTER = 1 << 1;
        /// Class, data type or data case: has a user-visible name.
        const IS_NOMINAL = 1 << 2;
        const IS_CLOSURE = 1 << 3;
        /// Unresolved or derived type variable.
        const IS_VAR = 1 << 4;
        /// Built-in struct type (String, Type, Dynamic).
        const IS_BUILTIN_STRUCT = 1 << 5;
    }
}
