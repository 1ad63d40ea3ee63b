//! Emitted-name bookkeeping.
//!
//! Two global namespaces are tracked: shim exports (C symbols) and host
//! module attributes. Class members live in a per-class [`ClassScope`]. The
//! first claimant of a name wins; later claimants are skipped.

use crate::errors::SkipReason;
use std::collections::HashSet;

/// Items defined by the shim preamble, which no export may redefine.
pub const RESERVED_EXPORTS: &[&str] = &[
    "IncRef",
    "DecRef",
    "CHandle",
    "REGISTRY",
    "PyObject",
    "PyErr_SetString",
    "PyExc_RuntimeError",
    "hb_registry",
    "hb_raise",
    "handles",
    "convert",
    "Handle",
    "HandleRegistry",
    "bool_to_c",
    "c_to_bool",
    "string_to_c",
    "c_to_string",
    "error_message",
];

/// Module attributes defined by the wrapper preamble.
pub const RESERVED_HOST_NAMES: &[&str] = &["NativeObject"];

/// Attributes every wrapper instance carries.
pub const RESERVED_MEMBER_NAMES: &[&str] = &["handle"];

#[derive(Debug, Default)]
pub struct NameRegistry {
    exports: HashSet<String>,
    host: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct ClassScope {
    members: HashSet<String>,
}

impl NameRegistry {
    pub fn new(extension_module: &str) -> Self {
        let mut registry = Self::default();
        registry.exports.extend(RESERVED_EXPORTS.iter().map(|s| s.to_string()));
        registry.host.extend(RESERVED_HOST_NAMES.iter().map(|s| s.to_string()));
        registry.host.insert(extension_module.to_string());
        registry
    }

    /// Claims a module-level host name (class or constant) with no export.
    pub fn claim_host(&mut self, host: &str) -> Result<(), SkipReason> {
        if self.host.contains(host) {
            return Err(collision(host));
        }
        self.host.insert(host.to_string());
        Ok(())
    }

    /// Claims an export together with its module-level host name.
    pub fn claim_call(&mut self, export: &str, host: &str) -> Result<(), SkipReason> {
        if self.exports.contains(export) {
            return Err(collision(export));
        }
        if self.host.contains(host) {
            return Err(collision(host));
        }
        self.exports.insert(export.to_string());
        self.host.insert(host.to_string());
        Ok(())
    }

    /// Claims an export together with a member name inside `scope`.
    pub fn claim_member(
        &mut self,
        scope: &mut ClassScope,
        export: &str,
        member: &str,
    ) -> Result<(), SkipReason> {
        if self.exports.contains(export) {
            return Err(collision(export));
        }
        if RESERVED_MEMBER_NAMES.contains(&member) || scope.members.contains(member) {
            return Err(collision(member));
        }
        self.exports.insert(export.to_string());
        scope.members.insert(member.to_string());
        Ok(())
    }
}

fn collision(name: &str) -> SkipReason {
    SkipReason::NameCollision {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let mut names = NameRegistry::new("_shapes");
        names.claim_call("Divide", "Divide").unwrap();
        assert_eq!(
            names.claim_call("Divide", "Divide"),
            Err(SkipReason::NameCollision {
                name: "Divide".into()
            })
        );
        assert!(names.claim_call("IncRef", "IncRef").is_err());
        /* a method export spelled like a preamble helper is refused */
        assert!(names
            .claim_member(&mut ClassScope::default(), "hb_registry", "registry")
            .is_err());
        assert!(names.claim_host("NativeObject").is_err());
        assert!(names.claim_host("_shapes").is_err());
    }

    #[test]
    fn test_failed_claim_reserves_nothing() {
        let mut names = NameRegistry::new("_m");
        names.claim_host("Foo").unwrap();
        assert!(names.claim_call("Foo_export", "Foo").is_err());
        /* the export of the failed claim is still free */
        names.claim_call("Foo_export", "Bar").unwrap();
    }

    #[test]
    fn test_member_scopes_are_per_class() {
        let mut names = NameRegistry::new("_m");
        let mut foo = ClassScope::default();
        let mut bar = ClassScope::default();
        names.claim_member(&mut foo, "Foo_Get", "Get").unwrap();
        names.claim_member(&mut bar, "Bar_Get", "Get").unwrap();
        assert!(names.claim_member(&mut foo, "Foo_Get_2", "Get").is_err());
        assert!(names.claim_member(&mut foo, "Foo_handle_Get", "handle").is_err());
        /* member names do not occupy the module namespace */
        names.claim_call("Get", "Get").unwrap();
    }
}
