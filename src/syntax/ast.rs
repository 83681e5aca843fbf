//! Declaration-level syntax trees.
//!
//! The AST deliberately stops at the structure the query layer consumes:
//! package clause, imports, type declarations with struct fields and
//! interface methods, function declarations with receiver and arity, and
//! const/var names. Function bodies and initializer expressions are not
//! represented — the parser skips them.

use std::fmt;

use smol_str::SmolStr;

use crate::base::TextRange;

/// One parsed source file.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Name from the `package` clause.
    pub package_name: SmolStr,
    /// Imports across all import declarations, in source order.
    pub imports: Vec<ImportDecl>,
    /// Top-level declarations, in source order.
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Iterate over type declarations, in source order.
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Iterate over function declarations, in source order.
    pub fn func_decls(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }
}

/// A single import spec: `import alias "path"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDecl {
    /// Explicit alias, if any. `_` and `.` imports carry their literal
    /// alias; a plain `import "x/y"` has `None` and defaults to the imported
    /// package's declared name.
    pub alias: Option<SmolStr>,
    /// The import path, unquoted.
    pub path: SmolStr,
    pub span: TextRange,
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    Const(ValueDecl),
    Var(ValueDecl),
}

impl Decl {
    /// Source range of the declaration.
    pub fn span(&self) -> TextRange {
        match self {
            Decl::Type(d) => d.span,
            Decl::Func(d) => d.span,
            Decl::Const(d) | Decl::Var(d) => d.span,
        }
    }

    /// Package-scope names this declaration introduces. Methods introduce
    /// none; const/var specs may introduce several.
    pub fn introduced_names(&self) -> Vec<SmolStr> {
        match self {
            Decl::Type(d) => vec![d.name.clone()],
            Decl::Func(d) if d.receiver.is_none() => vec![d.name.clone()],
            Decl::Func(_) => Vec::new(),
            Decl::Const(d) | Decl::Var(d) => d.names.clone(),
        }
    }
}

/// `type Name Underlying` or `type Name = Target`.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: SmolStr,
    pub ty: TypeExpr,
    /// True for alias declarations (`type A = B`).
    pub alias: bool,
    pub span: TextRange,
}

/// A type expression, kept unresolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Name` or `pkg.Name`.
    Named {
        qualifier: Option<SmolStr>,
        name: SmolStr,
    },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T` — the length expression is not retained.
    Array(Box<TypeExpr>),
    /// `map[K]V`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `chan T`, `<-chan T`, `chan<- T` — directions are not retained.
    Chan(Box<TypeExpr>),
    /// A function type; only arity survives.
    Func(FuncSig),
    Struct(StructType),
    Interface(InterfaceType),
}

impl TypeExpr {
    /// Strip at most one level of pointer indirection, mirroring the
    /// language's method-set rules for `*T` vs `T`.
    pub fn deref_once(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer(inner) => inner,
            other => other,
        }
    }

    /// The (qualifier, name) of the underlying named type, after stripping
    /// one pointer level. `None` for shapes with no base name (slices,
    /// maps, funcs, inline structs, ...).
    pub fn base_name(&self) -> Option<(Option<&str>, &str)> {
        match self.deref_once() {
            TypeExpr::Named { qualifier, name } => {
                Some((qualifier.as_deref(), name.as_str()))
            }
            _ => None,
        }
    }

    /// True if the outermost shape is a pointer.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeExpr::Pointer(_))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { qualifier: Some(q), name } => write!(f, "{q}.{name}"),
            TypeExpr::Named { qualifier: None, name } => write!(f, "{name}"),
            TypeExpr::Pointer(t) => write!(f, "*{t}"),
            TypeExpr::Slice(t) => write!(f, "[]{t}"),
            TypeExpr::Array(t) => write!(f, "[N]{t}"),
            TypeExpr::Map(k, v) => write!(f, "map[{k}]{v}"),
            TypeExpr::Chan(t) => write!(f, "chan {t}"),
            TypeExpr::Func(sig) => {
                write!(f, "func({} params, {} results)", sig.params, sig.results)
            }
            TypeExpr::Struct(s) => write!(f, "struct{{{} fields}}", s.fields.len()),
            TypeExpr::Interface(i) => {
                write!(f, "interface{{{} methods}}", i.methods.len())
            }
        }
    }
}

/// Arity of a function: the implements check matches on counts only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FuncSig {
    pub params: usize,
    pub results: usize,
}

/// `struct { ... }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructType {
    pub fields: Vec<Field>,
}

/// One struct field. A field declaration with several names (`A, B int`)
/// produces one `Field` per name; the tag, if any, attaches to each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Empty for an embedded (anonymous) field.
    pub name: SmolStr,
    pub ty: TypeExpr,
    /// Raw tag content, backticks/quotes stripped.
    pub tag: Option<SmolStr>,
    pub embedded: bool,
    pub span: TextRange,
}

/// `interface { ... }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceType {
    pub methods: Vec<InterfaceMethod>,
    /// Embedded interfaces (`io.Reader` inside another interface body).
    /// Constraint elements (`~int | ~string`) are not recorded.
    pub embeds: Vec<TypeExpr>,
}

/// One method requirement in an interface body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub name: SmolStr,
    pub sig: FuncSig,
    pub span: TextRange,
}

/// A top-level `func` declaration. Bodies are skipped at parse time.
#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub name: SmolStr,
    /// Present for methods.
    pub receiver: Option<Receiver>,
    pub sig: FuncSig,
    pub span: TextRange,
}

/// A method receiver: `(r *T)` or `(r T)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<SmolStr>,
    /// Base type name, type parameters dropped.
    pub type_name: SmolStr,
    pub pointer: bool,
}

/// One const or var spec; initializer expressions are skipped.
#[derive(Clone, Debug)]
pub struct ValueDecl {
    pub names: Vec<SmolStr>,
    pub span: TextRange,
}
