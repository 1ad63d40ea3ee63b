//! Binding IR shared by every output stream.
//!
//! The builder lowers an analyzed package into one ordered [`BindingIr`];
//! each renderer walks the same item sequence independently. Every call
//! carries everything all three fragments need (shim types, host tags,
//! conversions, zero values), so renderers never consult the symbol table.
//!
//! # Example
//! ```
//! use hostbind_gen::codegen::shared::ir::*;
//! use hostbind_gen::config::HandleRepr;
//!
//! let ir = BindingIr::new(
//!     PackageIdentity { path: "shapes".into(), name: "shapes".into(), doc: None },
//!     HandleRepr::default(),
//!     "hostbind gen --vm=python3 -f shapes.yaml".into(),
//! );
//! assert_eq!(ir.version, IR_SCHEMA_VERSION);
//! assert!(ir.items.is_empty());
//! ```

use crate::config::HandleRepr;
use crate::errors::Diagnostic;
use crate::model::{ShimType, SymbolKind};
use serde_derive::{Deserialize, Serialize};

/// Schema version used for every serialized IR export.
pub const IR_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Native crate/module path.
    pub path: String,
    /// Host module name; the extension module is `_<name>`.
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
}

impl PackageIdentity {
    pub fn extension_module(&self) -> String {
        format!("_{}", self.name)
    }

    /// Crate that must be linked into the shim (first path segment).
    pub fn native_crate(&self) -> &str {
        self.path.split("::").next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingIr {
    pub version: u32,
    pub package: PackageIdentity,
    pub handle: HandleRepr,
    pub regenerate_command: String,
    pub items: Vec<BindingItem>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl BindingIr {
    pub fn new(package: PackageIdentity, handle: HandleRepr, regenerate_command: String) -> Self {
        Self {
            version: IR_SCHEMA_VERSION,
            package,
            handle,
            regenerate_command,
            items: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// All calls in emission order, including class members and accessors.
    pub fn calls(&self) -> Vec<&CallBinding> {
        let mut calls = Vec::new();
        for item in &self.items {
            match item {
                BindingItem::Call(call) => calls.push(call),
                BindingItem::Variable(var) => {
                    calls.push(&var.getter);
                    calls.extend(var.setter.iter());
                }
                BindingItem::Class(class) => {
                    calls.extend(class.methods.iter());
                    calls.extend(class.properties.iter());
                }
                _ => {}
            }
        }
        calls
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", content = "body", rename_all = "kebab-case")]
pub enum BindingItem {
    Section(Section),
    HandleType(HandleTypeBinding),
    Constant(ConstBinding),
    Variable(VarBinding),
    Class(ClassBinding),
    Call(CallBinding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Types,
    Constants,
    Variables,
    Interfaces,
    Structs,
    Constructors,
    Functions,
}

impl Section {
    pub const ORDER: [Section; 7] = [
        Section::Types,
        Section::Constants,
        Section::Variables,
        Section::Interfaces,
        Section::Structs,
        Section::Constructors,
        Section::Functions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Types => "Types",
            Section::Constants => "Constants",
            Section::Variables => "Global Variables: can only use functions to access",
            Section::Interfaces => "Interfaces",
            Section::Structs => "Structs",
            Section::Constructors => "Constructors",
            Section::Functions => "Functions",
        }
    }
}

/// Shim conversion helpers for one handle-requiring type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleTypeBinding {
    pub kind: SymbolKind,
    /// Type accepted by `to_handle`, e.g. `Box<shapes::Foo>`.
    pub native_type: String,
    /// Type held in the registry.
    pub stored_type: String,
    pub host_class: String,
    pub to_handle: String,
    /// Absent for `Box` kinds, which share the pointee's lookup helper.
    pub from_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstBinding {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// Host-language literal.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarBinding {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    pub getter: CallBinding,
    #[serde(default)]
    pub setter: Option<CallBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassKind {
    Struct,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBinding {
    pub name: String,
    pub kind: ClassKind,
    #[serde(default)]
    pub doc: Option<String>,
    pub stored_type: String,
    /// Read-only field accessors.
    pub properties: Vec<CallBinding>,
    pub methods: Vec<CallBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    Function,
    Constructor,
    Method,
    FieldGetter,
    VarGetter,
    VarSetter,
}

/// What the shim body invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "kebab-case")]
pub enum NativeTarget {
    Function { path: String },
    Method { name: String },
    TraitMethod { trait_path: String, name: String },
    Field { name: String },
    VarRead { path: String },
    VarWrite { path: String },
}

/// How a converted argument is handed to the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassMode {
    Value,
    /// `&x` (text as `&str`).
    Borrow,
    /// `&*x` through the registry `Arc`.
    Deref,
    /// `&**x` through the `Arc` and the trait-object `Box`.
    DerefDyn,
}

/// One value crossing the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBinding {
    /// Native spelling, for comments and diagnostics.
    pub native_type: String,
    pub kind: SymbolKind,
    pub shim_type: ShimType,
    pub host_tag: String,
    #[serde(default)]
    pub to_host: Option<String>,
    #[serde(default)]
    pub from_host: Option<String>,
    pub zero_value: String,
    /// Set for handle-backed values.
    #[serde(default)]
    pub host_class: Option<String>,
    pub pass: PassMode,
}

impl ValueBinding {
    pub fn is_handle(&self) -> bool {
        self.host_class.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBinding {
    /// Sanitized name, identical in all three fragments.
    pub name: String,
    pub value: ValueBinding,
}

/// One exported call, the unit every stream renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallBinding {
    pub kind: CallKind,
    /// Shim symbol and declaration name.
    pub export_name: String,
    /// Name in the host wrapper (module-level or class member).
    pub host_name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub receiver: Option<ValueBinding>,
    pub params: Vec<ParamBinding>,
    #[serde(default)]
    pub result: Option<ValueBinding>,
    /// Native call returns `Result`; failures raise in the host.
    pub raises: bool,
    pub target: NativeTarget,
}

impl CallBinding {
    pub fn needs_registry(&self) -> bool {
        self.receiver.is_some()
            || self.params.iter().any(|p| p.value.is_handle())
            || self.result.as_ref().is_some_and(ValueBinding::is_handle)
    }
}
