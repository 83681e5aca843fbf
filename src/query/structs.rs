//! Struct and field query results.
//!
//! These are views over a package's parsed state, rebuilt on every lookup —
//! only parsing is cached. Each field keeps a handle to its declaring
//! package and file, which is what lets embedded-field flattening and the
//! implements check resolve a field's type across package boundaries.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::TextRange;
use crate::error::{Error, Result};
use crate::project::{Package, TypeSpec};
use crate::query::implements;
use crate::syntax::{tag, TypeExpr};

/// A struct declaration with its materialized field list.
#[derive(Clone)]
pub struct StructInfo {
    package: Arc<Package>,
    name: SmolStr,
    file: SmolStr,
    span: TextRange,
    fields: Vec<FieldInfo>,
}

impl StructInfo {
    pub(crate) fn from_spec(package: Arc<Package>, spec: TypeSpec) -> Result<StructInfo> {
        let TypeExpr::Struct(st) = &spec.decl.ty else {
            return Err(Error::UnsupportedShape(
                format!(
                    "type '{}' in package '{}' is {}, not a struct",
                    spec.decl.name,
                    package.import_path(),
                    spec.decl.ty
                )
                .into(),
            ));
        };

        let fields = st
            .fields
            .iter()
            .map(|field| FieldInfo {
                name: field.name.clone(),
                ty: field.ty.clone(),
                tag: field.tag.clone(),
                embedded: field.embedded,
                span: field.span,
                package: package.clone(),
                file: spec.file.clone(),
            })
            .collect();

        Ok(StructInfo {
            name: spec.decl.name.clone(),
            file: spec.file,
            span: spec.decl.span,
            fields,
            package,
        })
    }

    /// The struct's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file (within the package) declaring the struct.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Source range of the declaration.
    pub fn span(&self) -> TextRange {
        self.span
    }

    /// The declaring package.
    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    /// The declaring package's canonical import path.
    pub fn import_path(&self) -> &str {
        self.package.import_path()
    }

    /// The struct's direct fields, in declaration order. Embedded fields
    /// appear as single entries with an empty name.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// The field list with embedded fields recursively flattened in, in
    /// declaration order.
    ///
    /// Embedded types are resolved in their declaring package — same-module
    /// directly, cross-module through the declaring file's imports — with
    /// one level of pointer indirection stripped. Fails atomically: either
    /// every field resolves or the whole query errors, and a struct that
    /// transitively embeds itself is [`Error::CycleDetected`].
    pub fn flattened_fields(&self) -> Result<Vec<FieldInfo>> {
        let mut out = Vec::new();
        let mut visiting = FxHashSet::default();
        self.flatten_into(&mut visiting, &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        visiting: &mut FxHashSet<String>,
        out: &mut Vec<FieldInfo>,
    ) -> Result<()> {
        let key = format!("{}:{}", self.import_path(), self.name);
        if !visiting.insert(key.clone()) {
            return Err(Error::CycleDetected(key.into()));
        }

        for field in &self.fields {
            if !field.embedded {
                out.push(field.clone());
                continue;
            }
            field.resolve_embedded()?.flatten_into(visiting, out)?;
        }

        // The set tracks the recursion path, not everything seen: diamond
        // embedding is legal, a loop is not.
        visiting.remove(&key);
        Ok(())
    }
}

impl std::fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructInfo")
            .field("package", &self.import_path())
            .field("name", &self.name)
            .field("file", &self.file)
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// One struct field.
#[derive(Clone)]
pub struct FieldInfo {
    name: SmolStr,
    ty: TypeExpr,
    tag: Option<SmolStr>,
    embedded: bool,
    span: TextRange,
    /// Declaring package and file: the origin the cross-module resolution
    /// of this field's type starts from.
    package: Arc<Package>,
    file: SmolStr,
}

impl FieldInfo {
    /// Field name; empty for an embedded field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's type expression, unresolved.
    pub fn ty(&self) -> &TypeExpr {
        &self.ty
    }

    /// True for embedded (anonymous) fields.
    pub fn embedded(&self) -> bool {
        self.embedded
    }

    /// True when the field's type is a pointer at the outermost level.
    pub fn is_pointer(&self) -> bool {
        self.ty.is_pointer()
    }

    /// Source range of the field declaration.
    pub fn span(&self) -> TextRange {
        self.span
    }

    /// The raw annotation string, if the field carries one.
    pub fn raw_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Look up one key of the field's tag; empty string when the key (or
    /// the whole tag) is absent.
    pub fn tag(&self, key: &str) -> String {
        self.raw_tag()
            .and_then(|raw| tag::lookup(raw, key))
            .unwrap_or_default()
    }

    /// The package the field was declared in.
    pub fn declaring_package(&self) -> &Arc<Package> {
        &self.package
    }

    /// The file (within the declaring package) the field was declared in.
    pub fn declaring_file(&self) -> &str {
        &self.file
    }

    /// Best-effort check whether the field's type satisfies the named
    /// interface. See [`crate::query::implements`] for the matching rules;
    /// any resolution failure degrades to `false`.
    pub fn implements(&self, iface_package: &Arc<Package>, iface_name: &str) -> bool {
        implements::field_implements(self, iface_package, iface_name)
    }

    /// Resolve the defining package of this field's type and return that
    /// type's base name alongside it.
    pub(crate) fn resolve_base_type(&self) -> Result<(Arc<Package>, SmolStr)> {
        match self.ty.base_name() {
            Some((None, name)) => Ok((self.package.clone(), SmolStr::new(name))),
            Some((Some(qualifier), name)) => {
                let path = self.package.import_path_by_selector(qualifier, &self.file)?;
                let dep = self.package.resolve_import(&path)?;
                Ok((dep, SmolStr::new(name)))
            }
            None => Err(Error::UnsupportedShape(
                format!(
                    "field type {} in package '{}' has no base name",
                    self.ty,
                    self.package.import_path()
                )
                .into(),
            )),
        }
    }

    /// Resolve an embedded field's type to the struct it names.
    fn resolve_embedded(&self) -> Result<StructInfo> {
        let (package, name) = self.resolve_base_type()?;
        package.get_struct(&name)
    }
}

impl std::fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty.to_string())
            .field("embedded", &self.embedded)
            .field("tag", &self.tag)
            .finish()
    }
}
