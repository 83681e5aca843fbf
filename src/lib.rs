//! # loupe
//!
//! Lazy module resolution, caching, and structural introspection for Go
//! source trees.
//!
//! The engine locates packages by name pattern, defers parsing until a
//! structural query actually needs a file's contents, resolves imports on
//! demand, and answers syntax-level questions — struct fields and tags,
//! interfaces, method sets, a best-effort implements check — without a
//! type checker. It backs code generators that need just enough structure
//! to synthesize new source.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! query    → struct/field views, embedded-field flattening, implements
//!   ↓
//! project  → BuildConfig, Locator + DirLocator, Package, Loader
//!   ↓
//! syntax   → logos lexer, declaration AST, structural parser, struct tags
//!   ↓
//! base     → primitives (FileId, FileSet, LineCol/LineIndex)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use loupe::{BuildConfig, Loader};
//!
//! let loader = Loader::for_root("/path/to/module", BuildConfig::host());
//! let packages = loader.load(["./..."]).into_result()?;
//!
//! let info = packages[0].get_struct("Config")?;
//! for field in info.flattened_fields()? {
//!     println!("{} tag={}", field.name(), field.tag("env"));
//! }
//! ```
//!
//! One [`Loader`] per run: its caches are append-only for the loader's
//! lifetime, which fits a batch analysis, not a long-lived server.

pub mod base;
pub mod error;
pub mod project;
pub mod query;
pub mod syntax;

pub use error::{Error, Result};
pub use project::{
    BuildConfig, CacheStats, DirLocator, FileMap, LoadResult, Loader, Locator, MethodInfo,
    ModuleRef, Package, PackageMeta, SymbolInfo, SymbolKind, TypeSpec,
};
pub use query::{FieldInfo, StructInfo};

// Re-export the foundation types alongside the high-level surface.
pub use base::{FileId, LineCol, LineIndex, TextRange, TextSize};
