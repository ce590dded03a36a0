//! String interning.

use rustc_hash::FxHashMap;

use crate::{sym, Name};

/// Interns strings into compact [`Name`] handles.
///
/// Construction pre-interns the [`sym`] table so the well-known symbol
/// constants are valid for any interner.
#[derive(Debug, Clone)]
pub struct StringInterner {
    map: FxHashMap<Box<str>, Name>,
    strings: Vec<Box<str>>,
}

impl StringInterner {
    /// Create an interner with the well-known symbols pre-interned.
    pub fn new() -> Self {
        let mut interner = StringInterner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(sym::PRELOADED.len() * 2),
        };
        for text in sym::PRELOADED {
            interner.intern(text);
        }
        interner
    }

    /// Intern a string, returning its handle.
    pub fn intern(&mut self, text: &str) -> Name {
        if let Some(&name) = self.map.get(text) {
            return name;
        }
        let name = Name::from_raw(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, name);
        name
    }

    /// Look up a string without interning it.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.map.get(text).copied()
    }

    /// Resolve a handle back to its text.
    ///
    /// # Panics
    /// Panics if the name was produced by a different interner.
    pub fn resolve(&self, name: Name) -> &str {
        &self.strings[name.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// An interner is never empty: the symbol table is pre-interned.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        StringInterner::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = StringInterner::new();
        let a = interner.intern("fact");
        let b = interner.intern("fact");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "fact");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        let mut interner = StringInterner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        assert_ne!(a, b);
    }
}
