use crate::language::diagnostics::Diagnostics;
use std::fmt;

/// Structural type tags. `Any` absorbs in both directions; everything else
/// only matches itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Any,
    Atom,
    Boolean,
    Char,
    Float,
    Int,
    List,
    Nil,
    Record,
    String,
    Underscore,
    Unknown,
    Unit,
}

impl Type {
    pub const ALL: [Type; 13] = [
        Type::Any,
        Type::Atom,
        Type::Boolean,
        Type::Char,
        Type::Float,
        Type::Int,
        Type::List,
        Type::Nil,
        Type::Record,
        Type::String,
        Type::Underscore,
        Type::Unknown,
        Type::Unit,
    ];

    pub const NUMERIC: [Type; 2] = [Type::Int, Type::Float];

    pub fn matches(self, expected: Type) -> bool {
        self == Type::Any || expected == Type::Any || self == expected
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Any => "Any",
            Type::Atom => "Atom",
            Type::Boolean => "Boolean",
            Type::Char => "Char",
            Type::Float => "Float",
            Type::Int => "Int",
            Type::List => "List",
            Type::Nil => "Nil",
            Type::Record => "Record",
            Type::String => "String",
            Type::Underscore => "Underscore",
            Type::Unknown => "Unknown",
            Type::Unit => "Unit",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records a mismatch against `line` and keeps going.
pub fn must_match(actual: Type, expected: Type, line: usize, diags: &mut Diagnostics) -> bool {
    if actual.matches(expected) {
        return true;
    }
    diags.error(
        line,
        format!("type mismatch: expected {expected}, got {actual}"),
    );
    false
}

/// Like [`must_match`] against a set of acceptable tags; one diagnostic names
/// the whole set.
pub fn must_match_any(
    actual: Type,
    expected: &[Type],
    line: usize,
    diags: &mut Diagnostics,
) -> bool {
    if actual == Type::Any || expected.contains(&Type::Any) {
        return true;
    }
    if expected.iter().any(|ty| actual.matches(*ty)) {
        return true;
    }
    let names: Vec<&str> = expected.iter().map(|ty| ty.name()).collect();
    diags.error(
        line,
        format!(
            "type mismatch: expected one of {}, got {actual}",
            names.join(", ")
        ),
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_absorbs_in_both_directions() {
        for ty in Type::ALL {
            assert!(Type::Any.matches(ty), "Any vs {ty}");
            assert!(ty.matches(Type::Any), "{ty} vs Any");
        }
    }

    #[test]
    fn distinct_tags_never_match() {
        for left in Type::ALL {
            for right in Type::ALL {
                if left == Type::Any || right == Type::Any {
                    continue;
                }
                assert_eq!(left.matches(right), left == right, "{left} vs {right}");
            }
        }
    }

    #[test]
    fn must_match_reports_without_aborting() {
        let mut diags = Diagnostics::new();
        assert!(!must_match(Type::String, Type::Int, 7, &mut diags));
        assert!(must_match(Type::Int, Type::Int, 8, &mut diags));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.entries()[0].line, 7);
        let msg = diags.entries()[0].message.clone();
        insta::assert_snapshot!(msg, @"type mismatch: expected Int, got String");
    }

    #[test]
    fn must_match_any_names_the_whole_list() {
        let mut diags = Diagnostics::new();
        assert!(!must_match_any(Type::Atom, &Type::NUMERIC, 2, &mut diags));
        assert_eq!(diags.len(), 1);
        let msg = diags.entries()[0].message.clone();
        insta::assert_snapshot!(msg, @"type mismatch: expected one of Int, Float, got Atom");
    }

    #[test]
    fn wildcard_short_circuits_lists() {
        let mut diags = Diagnostics::new();
        assert!(must_match_any(Type::Any, &[Type::Int], 1, &mut diags));
        assert!(must_match_any(Type::Char, &[Type::Int, Type::Any], 1, &mut diags));
        assert!(diags.is_empty());
    }
}
