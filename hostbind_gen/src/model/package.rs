//! Package analysis: turns a description into the immutable model that the
//! generators walk.

use super::symbols::{Classifier, DeclaredKind, Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::config::GenConfig;
use crate::errors::{Diagnostic, SkipReason};
use hostbind_types::{FuncDecl, PackageFile, TypeDeclKind};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone)]
pub struct Func {
    /// Exported base name (`Divide`, or `Get` for a method of `Foo`).
    pub name: String,
    pub native_name: String,
    pub doc: Option<String>,
    pub receiver: Option<SymbolId>,
    pub params: Vec<Param>,
    pub results: Vec<SymbolId>,
    /// The final result is the failure indicator.
    pub err: bool,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub doc: Option<String>,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone)]
pub struct Struct {
    pub name: String,
    pub doc: Option<String>,
    pub symbol: SymbolId,
    pub fields: Vec<Field>,
    pub methods: Vec<Func>,
    pub ctors: Vec<Func>,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub doc: Option<String>,
    pub symbol: SymbolId,
    pub methods: Vec<Func>,
}

#[derive(Debug, Clone)]
pub struct Const {
    pub name: String,
    pub doc: Option<String>,
    pub symbol: SymbolId,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub native_name: String,
    pub doc: Option<String>,
    pub symbol: SymbolId,
}

/// The analyzed package. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Package {
    pub path: String,
    pub name: String,
    pub doc: Option<String>,
    pub symbols: SymbolTable,
    pub structs: Vec<Struct>,
    pub interfaces: Vec<Interface>,
    pub funcs: Vec<Func>,
    pub consts: Vec<Const>,
    pub vars: Vec<Var>,
    /// Symbols dropped during analysis (unresolved types).
    pub diagnostics: Vec<Diagnostic>,
}

impl Package {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    pub fn analyze(file: &PackageFile, config: &GenConfig) -> Package {
        let path = config
            .package_path
            .clone()
            .unwrap_or_else(|| file.package.path.clone());
        let name = config
            .package_name
            .clone()
            .unwrap_or_else(|| file.package.name.clone());

        let mut analyzer = Analyzer {
            classifier: Classifier::new(&path, &config.handle),
            diagnostics: Vec::new(),
        };

        /* declare every type first so declaration order never matters */
        for decl in &file.types {
            let kind = match decl.kind {
                TypeDeclKind::Struct(_) => DeclaredKind::Struct,
                TypeDeclKind::Interface(_) => DeclaredKind::Interface,
            };
            analyzer.classifier.declare(&decl.name, kind);
        }

        let mut structs = Vec::new();
        let mut interfaces = Vec::new();
        for decl in &file.types {
            let type_expr = hostbind_types::TypeExpr::Named(decl.name.clone());
            let Some(symbol) = analyzer.classify(&decl.name, &type_expr) else {
                continue;
            };
            match &decl.kind {
                TypeDeclKind::Struct(body) => {
                    let fields = body
                        .fields
                        .iter()
                        .filter_map(|field| {
                            let label = format!("{}.{}", decl.name, field.name);
                            analyzer.classify(&label, &field.ty).map(|symbol| Field {
                                name: field.name.clone(),
                                doc: field.doc.clone(),
                                symbol,
                            })
                        })
                        .collect();
                    let methods = body
                        .methods
                        .iter()
                        .filter_map(|method| analyzer.func(method, Some((decl.name.as_str(), symbol))))
                        .collect();
                    structs.push(Struct {
                        name: decl.name.clone(),
                        doc: decl.doc.clone(),
                        symbol,
                        fields,
                        methods,
                        ctors: Vec::new(),
                    });
                }
                TypeDeclKind::Interface(body) => {
                    let methods = body
                        .methods
                        .iter()
                        .filter_map(|method| analyzer.func(method, Some((decl.name.as_str(), symbol))))
                        .collect();
                    interfaces.push(Interface {
                        name: decl.name.clone(),
                        doc: decl.doc.clone(),
                        symbol,
                        methods,
                    });
                }
            }
        }

        let mut funcs = Vec::new();
        for decl in &file.functions {
            let Some(func) = analyzer.func(decl, None) else {
                continue;
            };
            match constructed_struct(&func, analyzer.classifier.table()) {
                Some(class) => match structs.iter_mut().find(|s| s.name == class) {
                    Some(owner) => {
                        debug!(func = %func.name, class = %class, "constructor");
                        owner.ctors.push(func);
                    }
                    None => funcs.push(func),
                },
                None => funcs.push(func),
            }
        }

        let consts = file
            .constants
            .iter()
            .filter_map(|decl| {
                analyzer.classify(&decl.name, &decl.ty).map(|symbol| Const {
                    name: decl.name.clone(),
                    doc: decl.doc.clone(),
                    symbol,
                    value: decl.value.clone(),
                })
            })
            .collect();

        let vars = file
            .variables
            .iter()
            .filter_map(|decl| {
                analyzer.classify(&decl.name, &decl.ty).map(|symbol| Var {
                    name: decl.name.clone(),
                    native_name: decl.native_name().to_string(),
                    doc: decl.doc.clone(),
                    symbol,
                })
            })
            .collect();

        Package {
            path,
            name,
            doc: file.package.doc.clone(),
            symbols: analyzer.classifier.into_table(),
            structs,
            interfaces,
            funcs,
            consts,
            vars,
            diagnostics: analyzer.diagnostics,
        }
    }
}

struct Analyzer {
    classifier: Classifier,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    fn classify(&mut self, label: &str, ty: &hostbind_types::TypeExpr) -> Option<SymbolId> {
        match self.classifier.classify(ty) {
            Ok(id) => Some(id),
            Err(reason) => {
                self.skip(label, reason);
                None
            }
        }
    }

    fn skip(&mut self, label: &str, reason: SkipReason) {
        warn!(symbol = %label, reason = %reason, "skipping");
        self.diagnostics.push(Diagnostic::new(label, reason));
    }

    fn func(&mut self, decl: &FuncDecl, owner: Option<(&str, SymbolId)>) -> Option<Func> {
        let label = match owner {
            Some((type_name, _)) => format!("{}.{}", type_name, decl.name),
            None => decl.name.clone(),
        };

        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let symbol = self.classify(&label, &param.ty)?;
            params.push(Param {
                name: param.name.clone(),
                symbol,
            });
        }
        let mut results = Vec::with_capacity(decl.results.len());
        for result in &decl.results {
            results.push(self.classify(&label, result)?);
        }

        let err = decl.results.last().is_some_and(|ty| ty.is_error());
        Some(Func {
            name: decl.name.clone(),
            native_name: decl.native_name().to_string(),
            doc: decl.doc.clone(),
            receiver: owner.map(|(_, symbol)| symbol),
            params,
            results,
            err,
        })
    }
}

/* A free function whose primary result is a package struct (or a Box of one) constructs it */
fn constructed_struct(func: &Func, table: &SymbolTable) -> Option<String> {
    let primary = table.get(*func.results.first()?);
    match primary.kind {
        SymbolKind::Struct => primary.host_class.clone(),
        SymbolKind::Pointer if primary.requires_handle => primary.host_class.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(yaml: &str) -> Package {
        let file: PackageFile = serde_yml::from_str(yaml).unwrap();
        Package::analyze(&file, &GenConfig::default())
    }

    #[test]
    fn test_constructors_are_attached_to_their_struct() {
        let package = analyze(
            r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind: { struct: {} }
functions:
  - { name: NewFoo, results: [Foo] }
  - { name: MakeFoo, results: ["Box<Foo>", error] }
  - { name: Count, results: [i64] }
"#,
        );
        assert_eq!(package.structs[0].ctors.len(), 2);
        assert_eq!(package.funcs.len(), 1);
        assert_eq!(package.funcs[0].name, "Count");
        assert!(package.structs[0].ctors[1].err);
    }

    #[test]
    fn test_unresolved_members_are_dropped_with_diagnostics() {
        let package = analyze(
            r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind:
      struct:
        fields:
          - { name: inner, type: "other::Thing" }
          - { name: value, type: i64 }
functions:
  - { name: Use, params: [{ name: x, type: Missing }] }
constants:
  - { name: Bad, type: Missing, value: "1" }
"#,
        );
        assert_eq!(package.structs[0].fields.len(), 1);
        assert!(package.funcs.is_empty());
        assert!(package.consts.is_empty());
        let skipped: Vec<&str> = package.diagnostics.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["Foo.inner", "Use", "Bad"]);
    }

    #[test]
    fn test_overrides_from_config() {
        let file: PackageFile =
            serde_yml::from_str("package: { path: shapes, name: shapes }\n").unwrap();
        let config = GenConfig {
            package_path: Some("geo::shapes".into()),
            package_name: Some("geo".into()),
            ..GenConfig::default()
        };
        let package = Package::analyze(&file, &config);
        assert_eq!(package.path, "geo::shapes");
        assert_eq!(package.name, "geo");
    }

    #[test]
    fn test_methods_carry_their_receiver() {
        let package = analyze(
            r#"
package: { path: shapes, name: shapes }
types:
  - name: Shape
    kind:
      interface:
        methods:
          - { name: Area, native-name: area, results: [f64] }
"#,
        );
        let iface = &package.interfaces[0];
        let method = &iface.methods[0];
        assert_eq!(method.receiver, Some(iface.symbol));
        assert_eq!(method.native_name, "area");
        assert!(!method.err);
    }
}
