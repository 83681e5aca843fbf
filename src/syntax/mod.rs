//! Structural syntax layer: lexer, declaration AST, parser, struct tags.
//!
//! "Structural" means the trees stop where the queries stop: declarations,
//! fields, tags, receivers, and arities are kept; bodies and expressions
//! are skipped. Parsing a file never consults other files — cross-file and
//! cross-package knowledge lives in the project layer.

pub mod ast;
pub mod parser;
pub mod tag;
pub mod token;

pub use ast::{
    Decl, Field, FuncDecl, FuncSig, ImportDecl, InterfaceMethod, InterfaceType, Receiver,
    SourceFile, StructType, TypeDecl, TypeExpr, ValueDecl,
};
pub use parser::parse_file;
pub use token::Token;
