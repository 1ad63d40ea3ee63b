//! Type classifier and conversion table.
//!
//! Every native type named by the description is classified once into a
//! [`Symbol`] that records how (and whether) it crosses the boundary. Symbols
//! are memoized by canonical type text and referenced by [`SymbolId`].

use crate::config::HandleRepr;
use crate::errors::SkipReason;
use crate::naming::snake_case;
use hostbind_types::{ScalarType, TypeExpr};
use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Basic(ScalarType),
    Struct,
    Interface,
    Pointer,
    Slice,
    Map,
    Array,
    Function,
    Error,
}

impl SymbolKind {
    pub fn tag(self) -> &'static str {
        match self {
            SymbolKind::Basic(_) => "basic",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Pointer => "pointer",
            SymbolKind::Slice => "slice",
            SymbolKind::Map => "map",
            SymbolKind::Array => "array",
            SymbolKind::Function => "function",
            SymbolKind::Error => "error",
        }
    }
}

/// Shim-side declared type of a boundary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShimType {
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    CString,
    Handle,
}

impl ShimType {
    /// Rust spelling inside the generated shim.
    pub fn rust_decl(self) -> &'static str {
        match self {
            ShimType::Char => "c_char",
            ShimType::I8 => "i8",
            ShimType::I16 => "i16",
            ShimType::I32 => "i32",
            ShimType::I64 => "i64",
            ShimType::U8 => "u8",
            ShimType::U16 => "u16",
            ShimType::U32 => "u32",
            ShimType::U64 => "u64",
            ShimType::F32 => "f32",
            ShimType::F64 => "f64",
            ShimType::CString => "*mut c_char",
            ShimType::Handle => "CHandle",
        }
    }
}

/// One classified native type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    /// Canonical description text, e.g. `Box<Foo>`.
    pub canonical: String,
    /// Rust spelling used inside the shim, e.g. `Box<shapes::Foo>`.
    pub native_name: String,
    pub shim_type: Option<ShimType>,
    pub host_tag: Option<String>,
    /// Native to shim conversion; `None` means identity.
    pub to_host: Option<String>,
    /// Shim to native conversion; `None` means identity.
    pub from_host: Option<String>,
    /// Shim-side literal returned on early exits.
    pub zero_value: Option<String>,
    pub host_class: Option<String>,
    /// Type held by the handle registry.
    pub stored_type: Option<String>,
    pub requires_handle: bool,
}

impl Symbol {
    /// True when values of this type can appear in a shim signature.
    pub fn is_boundary(&self) -> bool {
        self.shim_type.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.kind == SymbolKind::Error
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn is_interface(&self) -> bool {
        self.kind == SymbolKind::Interface
    }

    fn unsupported(kind: SymbolKind, canonical: String, native_name: String) -> Self {
        Symbol {
            id: SymbolId(0),
            kind,
            canonical,
            native_name,
            shim_type: None,
            host_tag: None,
            to_host: None,
            from_host: None,
            zero_value: None,
            host_class: None,
            stored_type: None,
            requires_handle: false,
        }
    }
}

/// Memoized symbols in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn lookup(&self, ty: &TypeExpr) -> Option<SymbolId> {
        self.symbols.get_index_of(&ty.to_string()).map(SymbolId)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn insert(&mut self, key: String, mut symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        symbol.id = id;
        self.symbols.insert(key, symbol);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredKind {
    Struct,
    Interface,
}

pub struct Classifier {
    package_path: String,
    handle: HandleRepr,
    declared: HashMap<String, DeclaredKind>,
    table: SymbolTable,
}

impl Classifier {
    pub fn new(package_path: &str, handle: &HandleRepr) -> Self {
        Self {
            package_path: package_path.to_string(),
            handle: handle.clone(),
            declared: HashMap::new(),
            table: SymbolTable::default(),
        }
    }

    /// Makes a package-level type name resolvable. Must precede any use.
    pub fn declare(&mut self, name: &str, kind: DeclaredKind) {
        self.declared.insert(name.to_string(), kind);
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    /// Returns the symbol for `ty`, creating it on first encounter.
    pub fn classify(&mut self, ty: &TypeExpr) -> Result<SymbolId, SkipReason> {
        if let Some(id) = self.table.lookup(ty) {
            return Ok(id);
        }
        let symbol = self.build(ty)?;
        let canonical = symbol.canonical.clone();
        let id = self.table.insert(canonical.clone(), symbol);
        debug!(ty = %canonical, kind = self.table.get(id).kind.tag(), "classified");
        Ok(id)
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}::{}", self.package_path, name)
    }

    fn build(&mut self, ty: &TypeExpr) -> Result<Symbol, SkipReason> {
        let canonical = ty.to_string();
        match ty {
            TypeExpr::Scalar(scalar) => Ok(scalar_symbol(*scalar, canonical)),
            TypeExpr::Error => Ok(Symbol::unsupported(
                SymbolKind::Error,
                canonical.clone(),
                canonical,
            )),
            TypeExpr::Named(name) => self.named_symbol(name, canonical),
            TypeExpr::Pointer(inner) => {
                let pointee = self.classify(inner)?;
                let pointee = self.table.get(pointee);
                let native_name = format!("Box<{}>", pointee.native_name);
                if pointee.kind != SymbolKind::Struct {
                    return Ok(Symbol::unsupported(SymbolKind::Pointer, canonical, native_name));
                }
                let snake = snake_case(pointee.host_class.as_deref().unwrap_or_default());
                Ok(Symbol {
                    id: SymbolId(0),
                    kind: SymbolKind::Pointer,
                    canonical,
                    native_name,
                    shim_type: Some(ShimType::Handle),
                    host_tag: Some(self.handle.host.clone()),
                    to_host: Some(format!("{}_ptr_to_handle", snake)),
                    from_host: pointee.from_host.clone(),
                    zero_value: Some("0".to_string()),
                    host_class: pointee.host_class.clone(),
                    stored_type: pointee.stored_type.clone(),
                    requires_handle: true,
                })
            }
            TypeExpr::Slice(inner) => {
                let elem = self.classify(inner)?;
                let native_name = format!("Vec<{}>", self.table.get(elem).native_name);
                Ok(Symbol::unsupported(SymbolKind::Slice, canonical, native_name))
            }
            TypeExpr::Map(key, value) => {
                let key = self.classify(key)?;
                let value = self.classify(value)?;
                let native_name = format!(
                    "HashMap<{}, {}>",
                    self.table.get(key).native_name,
                    self.table.get(value).native_name
                );
                Ok(Symbol::unsupported(SymbolKind::Map, canonical, native_name))
            }
            TypeExpr::Array(inner, len) => {
                let elem = self.classify(inner)?;
                let native_name = format!("[{}; {}]", self.table.get(elem).native_name, len);
                Ok(Symbol::unsupported(SymbolKind::Array, canonical, native_name))
            }
            TypeExpr::Function { .. } => Ok(Symbol::unsupported(
                SymbolKind::Function,
                canonical.clone(),
                canonical,
            )),
        }
    }

    fn named_symbol(&self, name: &str, canonical: String) -> Result<Symbol, SkipReason> {
        /* paths into other crates are not described, so they never resolve */
        let kind = match self.declared.get(name) {
            Some(kind) if !name.contains("::") => *kind,
            _ => return Err(SkipReason::Unresolved { ty: canonical }),
        };
        let snake = snake_case(name);
        let (kind, native_name) = match kind {
            DeclaredKind::Struct => (SymbolKind::Struct, self.qualify(name)),
            DeclaredKind::Interface => (
                SymbolKind::Interface,
                format!("Box<dyn {} + Send + Sync>", self.qualify(name)),
            ),
        };
        Ok(Symbol {
            id: SymbolId(0),
            kind,
            canonical,
            stored_type: Some(native_name.clone()),
            native_name,
            shim_type: Some(ShimType::Handle),
            host_tag: Some(self.handle.host.clone()),
            to_host: Some(format!("{}_to_handle", snake)),
            from_host: Some(format!("{}_from_handle", snake)),
            zero_value: Some("0".to_string()),
            host_class: Some(name.to_string()),
            requires_handle: true,
        })
    }
}

fn scalar_symbol(scalar: ScalarType, canonical: String) -> Symbol {
    let (shim, tag, to_host, from_host, zero) = match scalar {
        ScalarType::Bool => (ShimType::Char, "bool", Some("bool_to_c"), Some("c_to_bool"), "0"),
        ScalarType::I8 => (ShimType::I8, "int8_t", None, None, "0"),
        ScalarType::I16 => (ShimType::I16, "int16_t", None, None, "0"),
        ScalarType::I32 => (ShimType::I32, "int32_t", None, None, "0"),
        ScalarType::I64 => (ShimType::I64, "int64_t", None, None, "0"),
        ScalarType::U8 => (ShimType::U8, "uint8_t", None, None, "0"),
        ScalarType::U16 => (ShimType::U16, "uint16_t", None, None, "0"),
        ScalarType::U32 => (ShimType::U32, "uint32_t", None, None, "0"),
        ScalarType::U64 => (ShimType::U64, "uint64_t", None, None, "0"),
        ScalarType::F32 => (ShimType::F32, "float", None, None, "0.0"),
        ScalarType::F64 => (ShimType::F64, "double", None, None, "0.0"),
        ScalarType::Text => (
            ShimType::CString,
            "char*",
            Some("string_to_c"),
            Some("c_to_string"),
            "std::ptr::null_mut()",
        ),
    };
    Symbol {
        id: SymbolId(0),
        kind: SymbolKind::Basic(scalar),
        native_name: canonical.clone(),
        canonical,
        shim_type: Some(shim),
        host_tag: Some(tag.to_string()),
        to_host: to_host.map(str::to_string),
        from_host: from_host.map(str::to_string),
        zero_value: Some(zero.to_string()),
        host_class: None,
        stored_type: None,
        requires_handle: false,
    }
}
