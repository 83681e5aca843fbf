//! A lazily-parsed package.
//!
//! A [`Package`] is created by the loader as a metadata-only shell the
//! moment its [`PackageMeta`] is produced, and promoted to "parsed" on the
//! first structural query. The parse happens exactly once per package, no
//! matter how many threads race to trigger it, and a parse failure is
//! sticky: every later access replays the same error without touching the
//! files again.

use std::path::Path;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::project::loader::LoaderInner;
use crate::project::locator::PackageMeta;
use crate::query::StructInfo;
use crate::syntax::{FuncSig, ImportDecl, SourceFile, TypeDecl, TypeExpr};

/// Parsed syntax trees by file name, in the metadata's file-list order.
pub type FileMap = IndexMap<SmolStr, Arc<SourceFile>>;

/// A located type declaration: the file it lives in plus the declaration.
#[derive(Clone, Debug)]
pub struct TypeSpec {
    /// File name within the package.
    pub file: SmolStr,
    pub decl: TypeDecl,
}

/// One method collected for a type, receiver kind preserved.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: SmolStr,
    pub sig: FuncSig,
    pub pointer_receiver: bool,
    /// File name the method was declared in.
    pub file: SmolStr,
}

/// Lazy parse state. `Parsing` is only ever observed by threads that lost
/// the race to parse; they wait on the package's condvar.
enum ParseState {
    Unparsed,
    Parsing,
    Parsed(Arc<ParsedPackage>),
    Failed(Error),
}

pub(crate) struct ParsedPackage {
    pub(crate) files: Arc<FileMap>,
    /// Per-file import declarations, kept for selector resolution.
    pub(crate) imports: FxHashMap<SmolStr, Vec<ImportDecl>>,
}

/// One package of the dependency graph, owned by its loader.
pub struct Package {
    meta: PackageMeta,
    loader: Weak<LoaderInner>,
    state: Mutex<ParseState>,
    parsed_cond: Condvar,
    /// Imports this package has actually resolved, by canonical path. A
    /// local front for the loader's global cache so repeat lookups skip the
    /// round trip; the `Arc`s are the same global instances.
    resolved: Mutex<FxHashMap<Arc<str>, Arc<Package>>>,
}

impl Package {
    pub(crate) fn new(meta: PackageMeta, loader: Weak<LoaderInner>) -> Self {
        Self {
            meta,
            loader,
            state: Mutex::new(ParseState::Unparsed),
            parsed_cond: Condvar::new(),
            resolved: Mutex::new(FxHashMap::default()),
        }
    }

    /// The canonical import path identifying this package.
    pub fn import_path(&self) -> &str {
        &self.meta.import_path
    }

    /// The locator metadata this package was built from.
    pub fn raw_meta(&self) -> &PackageMeta {
        &self.meta
    }

    /// The package's source directory.
    pub fn dir(&self) -> &Path {
        &self.meta.dir
    }

    fn loader(&self) -> Result<Arc<LoaderInner>> {
        self.loader.upgrade().ok_or(Error::LoaderReleased)
    }

    // ========================================================================
    // LAZY PARSE
    // ========================================================================

    /// Parse every ordinary source file of the package, once.
    ///
    /// Subsequent calls return the same map. A failure on any file fails
    /// the whole operation and is sticky — partial parse state is never
    /// exposed.
    pub fn files(&self) -> Result<Arc<FileMap>> {
        Ok(self.ensure_parsed()?.files.clone())
    }

    /// The import declarations of one file, in source order.
    pub fn imports_of(&self, file: &str) -> Result<Vec<ImportDecl>> {
        let parsed = self.ensure_parsed()?;
        parsed.imports.get(file).cloned().ok_or_else(|| {
            Error::not_found(format!(
                "file '{file}' in package '{}'",
                self.meta.import_path
            ))
        })
    }

    /// The name from the package clause, falling back to the locator's
    /// guess for a package with no files.
    pub fn declared_name(&self) -> Result<SmolStr> {
        let parsed = self.ensure_parsed()?;
        match parsed.files.values().next() {
            Some(file) => Ok(file.package_name.clone()),
            None => Ok(self.meta.name.clone()),
        }
    }

    pub(crate) fn ensure_parsed(&self) -> Result<Arc<ParsedPackage>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                ParseState::Parsed(parsed) => return Ok(parsed.clone()),
                ParseState::Failed(err) => return Err(err.clone()),
                ParseState::Parsing => {
                    self.parsed_cond.wait(&mut state);
                }
                ParseState::Unparsed => {
                    *state = ParseState::Parsing;
                    break;
                }
            }
        }
        drop(state);

        // Parse outside the state lock so waiters block on the condvar, not
        // on a lock held across file IO.
        let result = self.parse_all();

        let mut state = self.state.lock();
        match &result {
            Ok(parsed) => *state = ParseState::Parsed(parsed.clone()),
            Err(err) => *state = ParseState::Failed(err.clone()),
        }
        drop(state);
        self.parsed_cond.notify_all();
        result
    }

    fn parse_all(&self) -> Result<Arc<ParsedPackage>> {
        let loader = self.loader()?;
        debug!(
            package = self.meta.import_path.as_ref(),
            files = self.meta.go_files.len(),
            "parsing package"
        );

        let mut files = FileMap::new();
        let mut imports: FxHashMap<SmolStr, Vec<ImportDecl>> = FxHashMap::default();
        for name in &self.meta.go_files {
            let path = self.meta.dir.join(name.as_str());
            let ast = loader.parse_source_file(&path)?;
            imports.insert(name.clone(), ast.imports.clone());
            files.insert(name.clone(), ast);
        }

        let parsed = Arc::new(ParsedPackage {
            files: Arc::new(files),
            imports,
        });
        loader.register_symbols(&self.meta.import_path, &self.meta.dir, &parsed.files);
        Ok(parsed)
    }

    // ========================================================================
    // IMPORT RESOLUTION
    // ========================================================================

    /// Resolve a canonical import path to its package.
    ///
    /// The path must be declared: either imported by one of this package's
    /// files or listed among its raw dependencies. Resolving anything else
    /// is a contract violation reported as [`Error::UndeclaredImport`].
    pub fn resolve_import(self: &Arc<Self>, path: &str) -> Result<Arc<Package>> {
        if !self.declares_import(path)? {
            return Err(Error::UndeclaredImport {
                package: self.meta.import_path.clone(),
                path: path.into(),
            });
        }

        if let Some(hit) = self.resolved.lock().get(path) {
            return Ok(hit.clone());
        }

        let loader = self.loader()?;
        let package = loader.resolve_import(&self.meta.import_path, path)?;

        self.resolved
            .lock()
            .entry(Arc::from(path))
            .or_insert_with(|| package.clone());
        Ok(package)
    }

    /// Whether `path` is declared by this package: an exact dependency, a
    /// subpackage of a declared dependency module, or imported by a parsed
    /// file.
    fn declares_import(&self, path: &str) -> Result<bool> {
        let declared_by_dep = self.meta.deps.iter().any(|dep| {
            path == dep.as_ref()
                || path
                    .strip_prefix(dep.as_ref())
                    .is_some_and(|rest| rest.starts_with('/'))
        });
        if declared_by_dep {
            return Ok(true);
        }
        // Intra-module imports are not in the dependency list; they show up
        // in the parsed files.
        let parsed = self.ensure_parsed()?;
        Ok(parsed
            .imports
            .values()
            .flatten()
            .any(|imp| imp.path == path))
    }

    /// Map a selector (the qualifier in `pkg.Type`) used in `file` to the
    /// canonical import path it refers to.
    ///
    /// Explicit aliases win; an un-aliased import matches when the resolved
    /// package's declared name equals the selector.
    pub fn import_path_by_selector(
        self: &Arc<Self>,
        selector: &str,
        file: &str,
    ) -> Result<Arc<str>> {
        let parsed = self.ensure_parsed()?;
        let file_imports = parsed.imports.get(file).ok_or_else(|| {
            Error::not_found(format!(
                "file '{file}' in package '{}'",
                self.meta.import_path
            ))
        })?;

        for imp in file_imports {
            match &imp.alias {
                Some(alias) if alias == selector => {
                    return Ok(Arc::from(imp.path.as_str()));
                }
                // Blank and dot imports never introduce a selector, and an
                // explicit alias shadows the package's own name.
                Some(_) => continue,
                None => match self.resolve_import(&imp.path) {
                    Ok(dep) => {
                        if dep.declared_name()? == selector {
                            return Ok(Arc::from(imp.path.as_str()));
                        }
                    }
                    Err(err) => {
                        // An unlocatable import (the standard library with
                        // no configured dep dir, say) still has a usable
                        // default alias: the path's last segment.
                        if imp.path.rsplit('/').next() == Some(selector) {
                            return Ok(Arc::from(imp.path.as_str()));
                        }
                        debug!(
                            package = self.meta.import_path.as_ref(),
                            import = imp.path.as_str(),
                            error = %err,
                            "skipping unresolvable import during selector lookup"
                        );
                    }
                },
            }
        }
        Err(Error::not_found(format!(
            "no import in '{file}' matches selector '{selector}'"
        )))
    }

    // ========================================================================
    // STRUCTURAL QUERIES
    // ========================================================================

    /// Find a struct type declaration and materialize its field list.
    pub fn get_struct(self: &Arc<Self>, name: &str) -> Result<StructInfo> {
        let spec = self.find_type_spec(name)?;
        StructInfo::from_spec(self.clone(), spec)
    }

    /// Find a type declaration by name, scanning files in file-list order.
    /// First match wins; in-package name collisions are assumed not to
    /// exist (the language enforces uniqueness).
    pub fn find_type_spec(&self, name: &str) -> Result<TypeSpec> {
        let parsed = self.ensure_parsed()?;
        for (file, ast) in parsed.files.iter() {
            for decl in ast.type_decls() {
                if decl.name == name {
                    return Ok(TypeSpec {
                        file: file.clone(),
                        decl: decl.clone(),
                    });
                }
            }
        }
        Err(Error::not_found(format!(
            "type '{name}' in package '{}'",
            self.meta.import_path
        )))
    }

    /// Find an interface type declaration by name.
    ///
    /// A same-named declaration of a different shape is reported as
    /// [`Error::UnsupportedShape`] rather than `NotFound`, so the caller can
    /// tell "absent" from "present but not an interface".
    pub fn find_interface(&self, name: &str) -> Result<TypeSpec> {
        let spec = self.find_type_spec(name)?;
        match &spec.decl.ty {
            TypeExpr::Interface(_) => Ok(spec),
            other => Err(Error::UnsupportedShape(
                format!(
                    "type '{name}' in package '{}' is {other}, not an interface",
                    self.meta.import_path
                )
                .into(),
            )),
        }
    }

    /// Collect all methods whose receiver's base type is `name`.
    ///
    /// Value and pointer receivers both answer; the distinction is kept on
    /// each entry for callers that care.
    pub fn methods_for_type(&self, name: &str) -> Result<Vec<MethodInfo>> {
        let parsed = self.ensure_parsed()?;
        let mut methods = Vec::new();
        for (file, ast) in parsed.files.iter() {
            for func in ast.func_decls() {
                if let Some(receiver) = &func.receiver {
                    if receiver.type_name == name {
                        methods.push(MethodInfo {
                            name: func.name.clone(),
                            sig: func.sig,
                            pointer_receiver: receiver.pointer,
                            file: file.clone(),
                        });
                    }
                }
            }
        }
        Ok(methods)
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("import_path", &self.meta.import_path)
            .field("dir", &self.meta.dir)
            .field("files", &self.meta.go_files.len())
            .finish()
    }
}
