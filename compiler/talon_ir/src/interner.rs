//! String interner shared by every syntax tree of a session.
//!
//! Interned strings are leaked so lookups can hand out `&'static str`
//! without holding the lock. A session interns a bounded vocabulary
//! (identifiers, literals, generated linkage names), so the leak is bounded
//! by the program being compiled.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Name;

#[derive(Default)]
struct InternerInner {
    map: FxHashMap<&'static str, Name>,
    strings: Vec<&'static str>,
}

/// Maps strings to [`Name`]s and back.
///
/// Interning takes `&self`, so the interner can be shared by reference
/// between the loader that builds trees and both compiler passes.
pub struct StringInterner {
    inner: RwLock<InternerInner>,
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned as
    /// [`Name::EMPTY`].
    pub fn new() -> Self {
        let interner = StringInterner {
            inner: RwLock::new(InternerInner::default()),
        };
        interner.intern("");
        interner
    }

    /// Intern `s`, returning the existing name if it was seen before.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&name) = self.inner.read().map.get(s) {
            return name;
        }
        let mut inner = self.inner.write();
        // Another writer may have won the race between the two locks.
        if let Some(&name) = inner.map.get(s) {
            return name;
        }
        let raw = u32::try_from(inner.strings.len())
            .unwrap_or_else(|_| panic!("string interner exceeded u32::MAX entries"));
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let name = Name::from_raw(raw);
        inner.strings.push(leaked);
        inner.map.insert(leaked, name);
        name
    }

    /// Resolve a name to its text.
    ///
    /// Names from a different interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner
            .read()
            .strings
            .get(name.raw() as usize)
            .copied()
            .unwrap_or("")
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.inner.read().map.get(s).copied()
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Always false: the empty string is interned on construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
