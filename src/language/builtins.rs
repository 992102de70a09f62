use crate::language::{scopes::CallableKind, types::Type};

/// A callable the host runtime provides without any import.
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub kind: CallableKind,
    pub returns: Option<Type>,
}

const fn function(name: &'static str, arity: usize, returns: Type) -> Builtin {
    Builtin {
        name,
        arity,
        kind: CallableKind::Function,
        returns: Some(returns),
    }
}

const fn procedure(name: &'static str, arity: usize) -> Builtin {
    Builtin {
        name,
        arity,
        kind: CallableKind::Procedure,
        returns: None,
    }
}

pub const BUILTINS: &[Builtin] = &[
    procedure("Browse", 1),
    procedure("Show", 1),
    procedure("Wait", 1),
    procedure("Delay", 1),
    procedure("ForAll", 2),
    function("Length", 1, Type::Int),
    function("Append", 2, Type::List),
    function("Reverse", 1, Type::List),
    function("Nth", 2, Type::Any),
    function("Member", 2, Type::Boolean),
    function("Map", 2, Type::List),
    function("Filter", 2, Type::List),
    function("FoldL", 3, Type::Any),
    function("IntToFloat", 1, Type::Float),
    function("FloatToInt", 1, Type::Int),
    function("IntToString", 1, Type::String),
    function("FloatToString", 1, Type::String),
    function("StringToAtom", 1, Type::Atom),
    function("AtomToString", 1, Type::String),
    function("IsInt", 1, Type::Boolean),
    function("Label", 1, Type::Atom),
    function("Width", 1, Type::Int),
    function("Abs", 1, Type::Any),
    function("Max", 2, Type::Any),
    function("Min", 2, Type::Any),
];
