pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod emit;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod preanalyze;
pub mod resolve;
pub mod scopes;
pub mod span;
pub mod token;
pub mod types;
