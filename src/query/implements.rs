//! Approximate interface-implementation check.
//!
//! This is name+arity matching, not signature equality: a candidate method
//! satisfies an interface method when the names and the parameter and
//! result counts agree. Good enough to distinguish "clearly implements"
//! from "clearly does not" without a type checker; wrong in the corner
//! cases where two same-named methods differ only in parameter types.
//!
//! Unlike every other query, this check is allowed to degrade: a resolution
//! failure along the way means "does not implement", never an error.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::Result;
use crate::project::{MethodInfo, Package};
use crate::query::structs::FieldInfo;
use crate::syntax::TypeExpr;

/// Whether `field`'s type satisfies the interface `iface_name` declared in
/// `iface_package`.
pub(crate) fn field_implements(
    field: &FieldInfo,
    iface_package: &Arc<Package>,
    iface_name: &str,
) -> bool {
    match check_field(field, iface_package, iface_name) {
        Ok(satisfied) => satisfied,
        Err(err) => {
            debug!(
                interface = iface_name,
                error = %err,
                "implements check degraded to false"
            );
            false
        }
    }
}

fn check_field(
    field: &FieldInfo,
    iface_package: &Arc<Package>,
    iface_name: &str,
) -> Result<bool> {
    // Shapes with no base name (slices, maps, funcs, ...) declare no
    // methods the structural layer can see.
    if field.ty().base_name().is_none() {
        return Ok(false);
    }
    let (package, type_name) = field.resolve_base_type()?;

    // Both the by-value and by-pointer method sets answer.
    let methods = package.methods_for_type(&type_name)?;

    let mut visiting = FxHashSet::default();
    interface_satisfied(iface_package, iface_name, &methods, &mut visiting)
}

/// Check every method the interface declares, recursing through embedded
/// interfaces. The visited set keys on `<import path>:<name>` and guards
/// against interfaces that embed themselves transitively.
fn interface_satisfied(
    iface_package: &Arc<Package>,
    iface_name: &str,
    methods: &[MethodInfo],
    visiting: &mut FxHashSet<String>,
) -> Result<bool> {
    let key = format!("{}:{}", iface_package.import_path(), iface_name);
    if !visiting.insert(key) {
        // An embedding loop can never be satisfied, but it is also not the
        // candidate's fault; treat it as unmet.
        return Ok(false);
    }

    let spec = iface_package.find_interface(iface_name)?;
    let TypeExpr::Interface(iface) = &spec.decl.ty else {
        // find_interface only returns interface shapes.
        return Ok(false);
    };

    // A zero-method interface holds vacuously.
    for wanted in &iface.methods {
        let satisfied = methods.iter().any(|m| {
            m.name == wanted.name
                && m.sig.params == wanted.sig.params
                && m.sig.results == wanted.sig.results
        });
        if !satisfied {
            return Ok(false);
        }
    }

    for embed in &iface.embeds {
        match embed.base_name() {
            Some((None, inner)) => {
                if !interface_satisfied(iface_package, inner, methods, visiting)? {
                    return Ok(false);
                }
            }
            Some((Some(qualifier), inner)) => {
                let path = iface_package.import_path_by_selector(qualifier, &spec.file)?;
                let dep = iface_package.resolve_import(&path)?;
                if !interface_satisfied(&dep, inner, methods, visiting)? {
                    return Ok(false);
                }
            }
            None => return Ok(false),
        }
    }

    Ok(true)
}
