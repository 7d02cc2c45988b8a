// Template directive parser module

pub mod ast;
pub mod directive;
pub mod lexer;

// Public API re-exports
pub use ast::{Directive, GraphDirective, GraphKind, StatKind, TextDirective};
pub use directive::parse_directive;
