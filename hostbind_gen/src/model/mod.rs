pub mod package;
pub mod symbols;

pub use package::{Const, Field, Func, Interface, Package, Param, Struct, Var};
pub use symbols::{Classifier, DeclaredKind, ShimType, Symbol, SymbolId, SymbolKind, SymbolTable};
