//! Type handle.
//!
//! Every type lives in the [`Pool`](crate::Pool) and is referred to by a
//! 32-bit [`Idx`]. Built-in types sit at fixed indices so they can be named
//! without a pool lookup.

use std::fmt;

/// Index of a type in the pool.
///
/// Two concrete types are the same type exactly when their indices are
/// equal. Type variables are the exception: compare through
/// [`Pool::same_type`](crate::Pool::same_type), which follows forwarding.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Built-in types, pre-interned in this order ===

    /// `Integer`, a 32-bit signed integer.
    pub const INTEGER: Self = Self(0);
    /// `Boolean`, a 1-bit integer.
    pub const BOOLEAN: Self = Self(1);
    /// `Char`, an 8-bit integer.
    pub const CHAR: Self = Self(2);
    pub const VOID: Self = Self(3);
    /// `String`, `{length, bytes}`.
    pub const STRING: Self = Self(4);
    /// `Type`, the runtime type record `{name}`.
    pub const TYPE: Self = Self(5);
    /// `Dynamic`, the type-erased box `{type, ...}`.
    pub const DYNAMIC: Self = Self(6);

    /// Number of pre-interned built-in types.
    pub const BUILTIN_COUNT: u32 = 7;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the pre-interned built-in types.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Idx::INTEGER => write!(f, "Idx::INTEGER"),
            Idx::BOOLEAN => write!(f, "Idx::BOOLEAN"),
            Idx::CHAR => write!(f, "Idx::CHAR"),
            Idx::VOID => write!(f, "Idx::VOID"),
            Idx::STRING => write!(f, "Idx::STRING"),
            Idx::TYPE => write!(f, "Idx::TYPE"),
            Idx::DYNAMIC => write!(f, "Idx::DYNAMIC"),
            Idx(raw) => write!(f, "Idx({raw})"),
        }
    }
}
