use crate::expr::TypeExpr;
use serde_derive::{Deserialize, Serialize};

/// Root of a package description file.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PackageFile {
    pub package: PackageMeta,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub functions: Vec<FuncDecl>,
    #[serde(default)]
    pub constants: Vec<ConstDecl>,
    #[serde(default)]
    pub variables: Vec<VarDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PackageMeta {
    /// Native crate or module path, e.g. `shapes` or `geo::shapes`.
    pub path: String,
    /// Host module name.
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub kind: TypeDeclKind,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum TypeDeclKind {
    Struct(StructDecl),
    Interface(InterfaceDecl),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct StructDecl {
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<FuncDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceDecl {
    #[serde(default)]
    pub methods: Vec<FuncDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub doc: Option<String>,
}

/// A free function or a method. `name` is the exported (host-visible) name;
/// `native-name` is the Rust identifier when it differs.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FuncDecl {
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<TypeExpr>,
}

impl FuncDecl {
    pub fn native_name(&self) -> &str {
        self.native_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ConstDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Literal value in native syntax (`42`, `3.5`, `true`, or raw text for `String`).
    pub value: String,
    #[serde(default)]
    pub doc: Option<String>,
}

/// A package-level `static NAME: RwLock<T>`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct VarDecl {
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub doc: Option<String>,
}

impl VarDecl {
    pub fn native_name(&self) -> &str {
        self.native_name.as_deref().unwrap_or(&self.name)
    }
}
