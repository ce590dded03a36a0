//! Well-known symbols, pre-interned at fixed indices.
//!
//! The structural predicates (`is`, `when`, `:` ...), the primitive type
//! names, and the operator glyphs used by the standard rules are interned by
//! [`StringInterner::new`](crate::StringInterner::new) in the exact order of
//! this table, so each constant below is valid in every interner.

use crate::Name;

macro_rules! syms {
    ($($name:ident => $text:expr),* $(,)?) => {
        syms!(@step 0u32; $($name => $text),*);
        /// All pre-interned symbols, in index order.
        pub(crate) const PRELOADED: &[&str] = &[$($text),*];
    };
    (@step $idx:expr; $name:ident => $text:expr $(, $rest:ident => $rtext:expr)*) => {
        pub const $name: Name = Name::from_raw($idx);
        syms!(@step $idx + 1u32; $($rest => $rtext),*);
    };
    (@step $idx:expr;) => {};
}

syms! {
    EMPTY => "",
    SEMICOLON => ";",
    NEWLINE => "\n",
    IS => "is",
    WHEN => "when",
    COLON => ":",
    AS => "as",
    ARROW => "=>",
    BAR => "|",
    DOTDOT => "..",
    COMMA => ",",
    TYPE => "type",
    SELF_ => "self",
    C => "C",
    BUILTIN => "builtin",
    EXTERN => "extern",
    TRUE => "true",
    FALSE => "false",
    NIL => "nil",
    SCOPE => "scope",
    INTEGER => "integer",
    REAL => "real",
    TEXT => "text",
    CHARACTER => "character",
    BOOLEAN => "boolean",
    TREE => "tree",
    SYMBOL => "symbol",
    INTEGER8 => "integer8",
    INTEGER16 => "integer16",
    INTEGER32 => "integer32",
    INTEGER64 => "integer64",
    UNSIGNED => "unsigned",
    UNSIGNED8 => "unsigned8",
    UNSIGNED16 => "unsigned16",
    UNSIGNED32 => "unsigned32",
    UNSIGNED64 => "unsigned64",
    REAL32 => "real32",
    REAL64 => "real64",
    PLUS => "+",
    MINUS => "-",
    STAR => "*",
    SLASH => "/",
    PERCENT => "%",
    LT => "<",
    GT => ">",
    LE => "<=",
    GE => ">=",
    EQ => "=",
    NE => "<>",
    AND => "and",
    OR => "or",
    NOT => "not",
    PAREN_OPEN => "(",
    PAREN_CLOSE => ")",
    BRACKET_OPEN => "[",
    BRACKET_CLOSE => "]",
    BRACE_OPEN => "{",
    BRACE_CLOSE => "}",
    QUOTE => "\"",
    TICK => "'",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringInterner;

    #[test]
    fn preloaded_symbols_resolve() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(EMPTY), "");
        assert_eq!(interner.resolve(IS), "is");
        assert_eq!(interner.resolve(WHEN), "when");
        assert_eq!(interner.resolve(ARROW), "=>");
        assert_eq!(interner.resolve(TICK), "'");
    }

    #[test]
    fn preloaded_symbols_are_stable() {
        let mut interner = StringInterner::new();
        for (index, text) in PRELOADED.iter().enumerate() {
            assert_eq!(interner.intern(text).raw() as usize, index);
        }
    }
}
