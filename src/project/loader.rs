//! The loader: per-run coordinator and owner of the three global caches.
//!
//! One [`Loader`] exists per analysis run. It owns every [`Package`] (keyed
//! by canonical import path), the syntax-tree cache (keyed by physical
//! file, so a file reachable from two package views parses once), and the
//! symbol index (`<import path>:<name>`). All three caches are pure
//! memoization: append-only, never invalidated, guarded by one mutex each.
//! No lock is held across a parse or a locator call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::base::{FileId, FileSet, TextRange};
use crate::error::{Error, Result};
use crate::project::config::BuildConfig;
use crate::project::locator::{DirLocator, Locator, PackageMeta};
use crate::project::module::{FileMap, Package};
use crate::syntax::{parse_file, Decl, SourceFile};

// ============================================================================
// SYMBOLS
// ============================================================================

/// What kind of declaration a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,
    Func,
    Const,
    Var,
}

/// One entry of the symbol index.
///
/// Populated as a side effect of a package's first successful parse. The
/// index exists for fast external lookup (the marker interpreter resolves
/// identifiers through it); the structural queries scan syntax directly and
/// never consult it.
#[derive(Clone)]
pub struct SymbolInfo {
    pub name: SmolStr,
    /// Import path of the declaring package.
    pub package: Arc<str>,
    /// The declaring file.
    pub file: FileId,
    pub kind: SymbolKind,
    pub span: TextRange,
    source: Arc<SourceFile>,
    decl_index: usize,
}

impl SymbolInfo {
    /// The declaration that introduced this symbol.
    pub fn decl(&self) -> &Decl {
        &self.source.decls[self.decl_index]
    }
}

impl std::fmt::Debug for SymbolInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolInfo")
            .field("name", &self.name)
            .field("package", &self.package)
            .field("file", &self.file)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// LOAD RESULT
// ============================================================================

/// Outcome of a multi-pattern load: the packages that resolved plus the
/// errors from patterns (or entries) that did not. A failing pattern never
/// prevents sibling patterns from loading.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub packages: Vec<Arc<Package>>,
    pub errors: Vec<Error>,
}

impl LoadResult {
    /// True when every pattern resolved.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold collected errors into a single [`Error::Load`].
    pub fn into_result(self) -> Result<Vec<Arc<Package>>> {
        if self.errors.is_empty() {
            Ok(self.packages)
        } else {
            Err(Error::Load(self.errors))
        }
    }
}

/// Counts of the loader's cache populations. Grow-only, like the caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub packages: usize,
    pub parsed_files: usize,
    pub symbols: usize,
}

// ============================================================================
// LOADER
// ============================================================================

/// The top-level entry point. Cheap to clone conceptually but deliberately
/// not `Clone`: one loader per run, passed by reference.
pub struct Loader {
    inner: Arc<LoaderInner>,
}

pub(crate) struct LoaderInner {
    config: BuildConfig,
    locator: Box<dyn Locator>,
    /// Canonical import path → package. Append-only.
    packages: Mutex<FxHashMap<Arc<str>, Arc<Package>>>,
    /// Physical file registry shared by every package view.
    files: FileSet,
    /// Parsed tree per physical file. Append-only.
    asts: Mutex<FxHashMap<FileId, Arc<SourceFile>>>,
    /// `<import path>:<name>` → symbol. Append-only.
    symbols: Mutex<FxHashMap<Arc<str>, SymbolInfo>>,
}

impl Loader {
    /// Create a loader with an injected locator strategy.
    pub fn new(config: BuildConfig, locator: impl Locator + 'static) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                config,
                locator: Box::new(locator),
                packages: Mutex::new(FxHashMap::default()),
                files: FileSet::new(),
                asts: Mutex::new(FxHashMap::default()),
                symbols: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Create a loader with the bundled [`DirLocator`] rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>, config: BuildConfig) -> Self {
        let locator = DirLocator::new(root);
        Self::new(config, locator)
    }

    /// The build configuration this loader passes to its locator.
    pub fn config(&self) -> &BuildConfig {
        &self.inner.config
    }

    /// Load the packages matching `patterns`.
    ///
    /// Each pattern costs one locator call. Metadata whose canonical path
    /// is already cached reuses the existing package, so overlapping and
    /// repeated loads are idempotent. Per-pattern failures are collected in
    /// the result; located entries that carry their own error string become
    /// [`Error::Locate`] entries without aborting the rest.
    pub fn load<'p>(&self, patterns: impl IntoIterator<Item = &'p str>) -> LoadResult {
        let mut result = LoadResult::default();
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();

        for pattern in patterns {
            match self.inner.locator.locate(pattern, &self.inner.config) {
                Err(err) => result.errors.push(err),
                Ok(metas) => {
                    for meta in metas {
                        if let Some(message) = &meta.error {
                            result.errors.push(Error::Locate {
                                path: meta.import_path.clone(),
                                message: message.as_str().into(),
                            });
                            continue;
                        }
                        let package = self.inner.insert_or_get(meta);
                        if seen.insert(Arc::from(package.import_path())) {
                            result.packages.push(package);
                        }
                    }
                }
            }
        }
        result
    }

    /// Peek at an already-cached package by canonical path.
    pub fn package(&self, import_path: &str) -> Option<Arc<Package>> {
        self.inner.packages.lock().get(import_path).cloned()
    }

    /// Look up a symbol by qualified `<import path>:<name>` key.
    ///
    /// Only packages that have parsed contribute entries; this is a memo
    /// index, not a query that triggers work.
    pub fn lookup_symbol(&self, qualified: &str) -> Option<SymbolInfo> {
        self.inner.symbols.lock().get(qualified).cloned()
    }

    /// The absolute path behind a [`FileId`], e.g. from [`SymbolInfo::file`].
    pub fn file_path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.files.path(file)
    }

    /// Current cache populations.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            packages: self.inner.packages.lock().len(),
            parsed_files: self.inner.asts.lock().len(),
            symbols: self.inner.symbols.lock().len(),
        }
    }
}

impl LoaderInner {
    /// Insert a package shell for `meta`, or return the cached one.
    /// Double-checked so concurrent resolution of the same path yields one
    /// live instance.
    fn insert_or_get(self: &Arc<Self>, meta: PackageMeta) -> Arc<Package> {
        let key = meta.import_path.clone();
        {
            if let Some(hit) = self.packages.lock().get(&key) {
                return hit.clone();
            }
        }
        let package = Arc::new(Package::new(meta, Arc::downgrade(self)));
        let mut packages = self.packages.lock();
        packages.entry(key).or_insert(package).clone()
    }

    /// Resolve `path` on behalf of `importer`.
    ///
    /// Requires exactly one located candidate whose canonical path equals
    /// the requested path: zero is [`Error::NotFound`], more than one is
    /// [`Error::AmbiguousResolution`]. Neither falls back silently.
    pub(crate) fn resolve_import(
        self: &Arc<Self>,
        importer: &str,
        path: &str,
    ) -> Result<Arc<Package>> {
        {
            if let Some(hit) = self.packages.lock().get(path) {
                trace!(importer, path, "import cache hit");
                return Ok(hit.clone());
            }
        }

        debug!(importer, path, "resolving import via locator");
        let metas = self.locator.locate(path, &self.config)?;
        let mut candidates: Vec<PackageMeta> = metas
            .into_iter()
            .filter(|meta| meta.import_path.as_ref() == path)
            .collect();

        let meta = match candidates.len() {
            0 => {
                return Err(Error::not_found(format!(
                    "package '{path}' (imported by '{importer}')"
                )));
            }
            1 => candidates.remove(0),
            count => {
                return Err(Error::AmbiguousResolution {
                    path: path.into(),
                    count,
                });
            }
        };

        if let Some(message) = &meta.error {
            return Err(Error::Locate {
                path: meta.import_path.clone(),
                message: message.as_str().into(),
            });
        }
        Ok(self.insert_or_get(meta))
    }

    /// Parse one physical file through the shared syntax-tree cache.
    pub(crate) fn parse_source_file(&self, path: &Path) -> Result<Arc<SourceFile>> {
        let file_id = self.files.file_id(path);
        {
            if let Some(hit) = self.asts.lock().get(&file_id) {
                trace!(file = %path.display(), "syntax cache hit");
                return Ok(hit.clone());
            }
        }

        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| Error::Io {
            path: display.as_str().into(),
            message: err.to_string().into(),
        })?;
        let ast = Arc::new(parse_file(&display, &text)?);

        // Two packages sharing the file can race here; the first insert
        // wins and both observe the same tree.
        let mut asts = self.asts.lock();
        Ok(asts.entry(file_id).or_insert(ast).clone())
    }

    /// Record every top-level declaration of a freshly parsed package.
    pub(crate) fn register_symbols(&self, package: &Arc<str>, dir: &Path, files: &FileMap) {
        let mut symbols = self.symbols.lock();
        for (file_name, ast) in files.iter() {
            let file_id = self.files.file_id(&dir.join(file_name.as_str()));
            for (decl_index, decl) in ast.decls.iter().enumerate() {
                let kind = match decl {
                    Decl::Type(_) => SymbolKind::Type,
                    Decl::Func(_) => SymbolKind::Func,
                    Decl::Const(_) => SymbolKind::Const,
                    Decl::Var(_) => SymbolKind::Var,
                };
                for name in decl.introduced_names() {
                    let qualified: Arc<str> = format!("{package}:{name}").into();
                    symbols.entry(qualified).or_insert_with(|| SymbolInfo {
                        name,
                        package: package.clone(),
                        file: file_id,
                        kind,
                        span: decl.span(),
                        source: ast.clone(),
                        decl_index,
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("Loader")
            .field("packages", &stats.packages)
            .field("parsed_files", &stats.parsed_files)
            .field("symbols", &stats.symbols)
            .finish()
    }
}
