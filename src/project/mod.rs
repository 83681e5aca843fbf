//! Project layer: build configuration, package location, lazy packages,
//! and the loader that coordinates them.
//!
//! Control flow runs top-down: callers hand patterns to the [`Loader`],
//! which asks the configured [`Locator`] for metadata and builds
//! [`Package`] shells. Everything after that is demand-driven — a package
//! parses on its first structural query, and resolves imports through the
//! loader only when a query actually crosses a package boundary.

pub mod config;
pub mod loader;
pub mod locator;
pub mod module;

pub use config::BuildConfig;
pub use loader::{CacheStats, LoadResult, Loader, SymbolInfo, SymbolKind};
pub use locator::{DirLocator, Locator, ModuleRef, PackageMeta};
pub use module::{FileMap, MethodInfo, Package, TypeSpec};
