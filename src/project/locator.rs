//! Package location: the pluggable strategy that maps name patterns to
//! package metadata without parsing any source.
//!
//! The [`Locator`] trait is the only seam between the engine and the
//! filesystem layout of a build. [`DirLocator`] is the bundled strategy: a
//! module-cache walker rooted at a directory with a `go.mod`-style manifest.
//! A toolchain-backed strategy (shelling out to the host's package lister)
//! fits behind the same trait.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::project::config::BuildConfig;

/// The module a located package belongs to.
#[derive(Clone, Debug)]
pub struct ModuleRef {
    /// The module's canonical path.
    pub path: Arc<str>,
    /// The module's root directory.
    pub dir: PathBuf,
}

/// Locator output: everything the loader needs to build a package shell.
///
/// Immutable once produced. A package created from this metadata keeps the
/// original value for provenance ([`Package::raw_meta`]).
///
/// [`Package::raw_meta`]: super::Package::raw_meta
#[derive(Clone, Debug)]
pub struct PackageMeta {
    /// Canonical import path; globally unique, the package cache key.
    pub import_path: Arc<str>,
    /// Declared package name. Locators that do not parse can only guess
    /// (directory basename); the authoritative name comes from the package
    /// clause once files are parsed.
    pub name: SmolStr,
    /// Absolute directory holding the package's sources.
    pub dir: PathBuf,
    /// Ordinary source file names, relative to `dir`, sorted.
    pub go_files: Vec<SmolStr>,
    /// In-package test file names (`_test.go`), sorted.
    pub test_go_files: Vec<SmolStr>,
    /// External-test-package file names. The bundled locator cannot
    /// distinguish these without parsing and leaves the list empty.
    pub x_test_go_files: Vec<SmolStr>,
    /// Directly-declared dependency module paths, from the owning module's
    /// manifest.
    pub deps: Vec<Arc<str>>,
    /// Owning module, when known.
    pub module: Option<ModuleRef>,
    /// Set when locating this entry partially failed. The entry still
    /// appears in the result list so sibling entries survive.
    pub error: Option<String>,
}

/// A strategy that locates packages by name pattern.
///
/// Contract:
/// - Pure with respect to on-disk state: the same pattern against the same
///   tree yields the same result.
/// - "Nothing matched" is `Err(NotFound)`, never an empty `Ok`.
/// - A partial failure (one entry of several) is reported on that entry's
///   `error` field, not by failing the call.
/// - May be called repeatedly for the same canonical path; the loader
///   deduplicates.
pub trait Locator: Send + Sync {
    fn locate(&self, pattern: &str, config: &BuildConfig) -> Result<Vec<PackageMeta>>;
}

// ============================================================================
// MANIFEST
// ============================================================================

#[derive(Clone, Debug, Default)]
struct Manifest {
    module_path: Arc<str>,
    requires: Vec<Arc<str>>,
}

/// Parse the subset of a `go.mod`-style manifest the locator needs: the
/// module path and the required module paths. Versions, replace directives,
/// and toolchain lines are ignored.
fn parse_manifest(text: &str) -> Manifest {
    let mut manifest = Manifest::default();
    let mut in_require_block = false;

    for raw in text.lines() {
        let line = match raw.find("//") {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
            } else if let Some(path) = line.split_whitespace().next() {
                manifest.requires.push(Arc::from(path));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ") {
            manifest.module_path = Arc::from(rest.trim().trim_matches('"'));
        } else if line == "require (" {
            in_require_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(path) = rest.split_whitespace().next() {
                manifest.requires.push(Arc::from(path));
            }
        }
    }
    manifest
}

fn read_manifest(dir: &Path) -> Option<Manifest> {
    let text = std::fs::read_to_string(dir.join("go.mod")).ok()?;
    Some(parse_manifest(&text))
}

// ============================================================================
// DIRECTORY LOCATOR
// ============================================================================

/// The bundled locator: resolves patterns against a module root directory
/// and a set of dependency directories laid out module-cache style
/// (`<dep_dir>/<module path>/...`).
///
/// Resolution order for a non-relative pattern:
/// 1. the current module (pattern under the module path)
/// 2. the dependency directories, in configured order
///
/// Relative patterns (`./x`, `.`) resolve against the root directly, and
/// `dir/...` enumerates every package under `dir`.
pub struct DirLocator {
    root: PathBuf,
    manifest: Manifest,
    dep_dirs: Vec<PathBuf>,
}

impl DirLocator {
    /// Create a locator rooted at `root`, reading `root/go.mod` when
    /// present. A missing manifest leaves the locator in relative-only mode.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        let manifest = read_manifest(&root).unwrap_or_default();
        Self {
            root,
            manifest,
            dep_dirs: Vec::new(),
        }
    }

    /// Add a dependency directory (module-cache layout).
    pub fn with_dep_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dep_dirs.push(dir.into());
        self
    }

    /// The module path from the manifest, empty when there is none.
    pub fn module_path(&self) -> &str {
        &self.manifest.module_path
    }

    fn root_module(&self) -> Option<ModuleRef> {
        if self.manifest.module_path.is_empty() {
            return None;
        }
        Some(ModuleRef {
            path: self.manifest.module_path.clone(),
            dir: self.root.clone(),
        })
    }

    /// Resolve a single (non-wildcard) pattern to a directory, a canonical
    /// import path, and the owning module.
    fn resolve_pattern(
        &self,
        pattern: &str,
    ) -> Result<(PathBuf, Arc<str>, Option<ModuleRef>, Vec<Arc<str>>)> {
        // Relative path.
        if pattern == "." || pattern.starts_with("./") || pattern.starts_with("../") {
            let rel = pattern.trim_start_matches("./");
            let dir = if rel == "." || rel.is_empty() {
                self.root.clone()
            } else {
                self.root.join(rel)
            };
            if !dir.is_dir() {
                return Err(Error::not_found(format!("package pattern '{pattern}'")));
            }
            let import_path = self.import_path_for_root_dir(&dir, pattern);
            return Ok((
                dir,
                import_path,
                self.root_module(),
                self.manifest.requires.clone(),
            ));
        }

        // Current module.
        let module_path = self.manifest.module_path.as_ref();
        if !module_path.is_empty() {
            if pattern == module_path {
                return Ok((
                    self.root.clone(),
                    self.manifest.module_path.clone(),
                    self.root_module(),
                    self.manifest.requires.clone(),
                ));
            }
            if let Some(rel) = pattern.strip_prefix(module_path).and_then(|r| r.strip_prefix('/')) {
                let dir = self.root.join(rel);
                if dir.is_dir() {
                    return Ok((
                        dir,
                        Arc::from(pattern),
                        self.root_module(),
                        self.manifest.requires.clone(),
                    ));
                }
                return Err(Error::not_found(format!("package pattern '{pattern}'")));
            }
        }

        // Dependency directories.
        for dep_dir in &self.dep_dirs {
            let dir = dep_dir.join(pattern);
            if dir.is_dir() {
                let module = self.owning_require(pattern).map(|path| ModuleRef {
                    dir: dep_dir.join(path.as_ref()),
                    path,
                });
                let deps = module
                    .as_ref()
                    .and_then(|m| read_manifest(&m.dir))
                    .map(|m| m.requires)
                    .unwrap_or_default();
                return Ok((dir, Arc::from(pattern), module, deps));
            }
        }

        Err(Error::not_found(format!("package pattern '{pattern}'")))
    }

    /// The longest required module path that is a prefix of `import_path`.
    fn owning_require(&self, import_path: &str) -> Option<Arc<str>> {
        self.manifest
            .requires
            .iter()
            .filter(|req| {
                import_path == req.as_ref()
                    || import_path
                        .strip_prefix(req.as_ref())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|req| req.len())
            .cloned()
    }

    /// Canonical import path for a directory under the root.
    fn import_path_for_root_dir(&self, dir: &Path, fallback: &str) -> Arc<str> {
        let module_path = self.manifest.module_path.as_ref();
        if module_path.is_empty() {
            return Arc::from(fallback.trim_start_matches("./"));
        }
        match dir.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => self.manifest.module_path.clone(),
            Ok(rel) => Arc::from(format!("{}/{}", module_path, slash_path(rel))),
            Err(_) => Arc::from(fallback.trim_start_matches("./")),
        }
    }

    fn scan_package(
        &self,
        import_path: Arc<str>,
        dir: PathBuf,
        module: Option<ModuleRef>,
        deps: Vec<Arc<str>>,
        config: &BuildConfig,
    ) -> PackageMeta {
        let mut go_files = Vec::new();
        let mut test_go_files = Vec::new();
        let mut error = None;

        match std::fs::read_dir(&dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                        continue;
                    }
                    let Ok(name) = entry.file_name().into_string() else {
                        continue;
                    };
                    if name.starts_with('_') || name.starts_with('.') {
                        continue;
                    }
                    if !config.file_matches(&name) {
                        continue;
                    }
                    let name = SmolStr::new(name);
                    if name.ends_with("_test.go") {
                        test_go_files.push(name);
                    } else {
                        go_files.push(name);
                    }
                }
                go_files.sort();
                test_go_files.sort();
                if go_files.is_empty() && test_go_files.is_empty() {
                    error = Some(format!("no Go files in {}", dir.display()));
                }
            }
            Err(e) => error = Some(format!("cannot list {}: {e}", dir.display())),
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(SmolStr::new)
            .unwrap_or_else(|| SmolStr::new(""));

        PackageMeta {
            import_path,
            name,
            dir,
            go_files,
            test_go_files,
            x_test_go_files: Vec::new(),
            deps,
            module,
            error,
        }
    }

    /// Enumerate every package directory under `base`, depth-first.
    /// Unreadable subdirectories surface as entries with `error` set.
    fn walk_packages(
        &self,
        base: &Path,
        config: &BuildConfig,
        out: &mut Vec<PackageMeta>,
    ) {
        let entries = match std::fs::read_dir(base) {
            Ok(entries) => entries,
            Err(e) => {
                out.push(PackageMeta {
                    import_path: self.import_path_for_root_dir(base, "."),
                    name: SmolStr::new(""),
                    dir: base.to_path_buf(),
                    go_files: Vec::new(),
                    test_go_files: Vec::new(),
                    x_test_go_files: Vec::new(),
                    deps: Vec::new(),
                    module: self.root_module(),
                    error: Some(format!("cannot list {}: {e}", base.display())),
                });
                return;
            }
        };

        let import_path = self.import_path_for_root_dir(base, ".");
        let meta = self.scan_package(
            import_path,
            base.to_path_buf(),
            self.root_module(),
            self.manifest.requires.clone(),
            config,
        );
        // Directories with no Go files are not packages; skip them silently
        // during discovery (a direct pattern for one still reports).
        if meta.error.is_none() || !meta.go_files.is_empty() {
            out.push(meta);
        }

        let mut subdirs: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.path())
            .collect();
        subdirs.sort();
        for subdir in subdirs {
            let Some(name) = subdir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            if name == "testdata" || name == "vendor" {
                continue;
            }
            self.walk_packages(&subdir, config, out);
        }
    }
}

impl Locator for DirLocator {
    fn locate(&self, pattern: &str, config: &BuildConfig) -> Result<Vec<PackageMeta>> {
        debug!(pattern, "locating packages");

        if let Some(base_pattern) = pattern.strip_suffix("/...") {
            let (dir, _, _, _) = self.resolve_pattern(if base_pattern.is_empty() {
                "."
            } else {
                base_pattern
            })?;
            let mut out = Vec::new();
            self.walk_packages(&dir, config, &mut out);
            if out.is_empty() {
                return Err(Error::not_found(format!("package pattern '{pattern}'")));
            }
            return Ok(out);
        }

        let (dir, import_path, module, deps) = self.resolve_pattern(pattern)?;
        Ok(vec![self.scan_package(import_path, dir, module, deps, config)])
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
