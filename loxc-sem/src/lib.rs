//! Name resolution and arity checking over a parsed [`Program`].
//!
//! [`Program`]: loxc_parse::Program

pub mod analysis;
pub mod scope;

pub use analysis::SemanticAnalyser;
pub use scope::{FunctionInfo, ScopeStack, Symbol, SymbolKind, SymbolTable};
