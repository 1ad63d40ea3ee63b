//! Signature translation.
//!
//! Lowers one function, method, field, or variable into a [`CallBinding`]
//! after checking that every value in the signature can cross the boundary.

use super::ir::{CallBinding, CallKind, NativeTarget, ParamBinding, PassMode, ValueBinding, VarBinding};
use crate::errors::{GenError, SkipReason};
use crate::model::{Field, Func, Package, Symbol, SymbolId, SymbolKind, SymbolTable, Var};
use crate::naming::{binding_param_name, escape_python_keyword, export_name, rust_ident};
use hostbind_types::ScalarType;
use thiserror::Error;

/// Either the symbol is skipped or generation must stop.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Skip(#[from] SkipReason),

    #[error(transparent)]
    Fatal(#[from] GenError),
}

/// The class a method or field belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    pub name: &'a str,
    pub symbol: SymbolId,
}

pub struct SignatureTranslator<'a> {
    symbols: &'a SymbolTable,
    package_path: &'a str,
    extension_module: String,
}

impl<'a> SignatureTranslator<'a> {
    pub fn new(package: &'a Package) -> Self {
        Self {
            symbols: &package.symbols,
            package_path: &package.path,
            extension_module: format!("_{}", package.name),
        }
    }

    fn symbol(&self, id: SymbolId) -> &'a Symbol {
        self.symbols.get(id)
    }

    /// Applies the skip policy to a signature.
    pub fn check_signature(&self, func: &Func) -> Result<(), SkipReason> {
        let results: Vec<&Symbol> = func.results.iter().map(|id| self.symbol(*id)).collect();
        match results.as_slice() {
            [] | [_] => {}
            [first, second] => {
                if first.is_error() {
                    return Err(SkipReason::ErrorNotLast);
                }
                if !second.is_error() {
                    return Err(SkipReason::SecondResultNotError {
                        found: second.canonical.clone(),
                    });
                }
            }
            _ => {
                return Err(SkipReason::TooManyResults {
                    count: results.len(),
                });
            }
        }

        for result in results.iter().filter(|r| !r.is_error()) {
            if result.is_function() {
                return Err(SkipReason::FunctionResult {
                    ty: result.canonical.clone(),
                });
            }
            if !result.is_boundary() {
                return Err(unsupported(result));
            }
        }

        for param in &func.params {
            let symbol = self.symbol(param.symbol);
            if symbol.is_error() {
                return Err(SkipReason::ErrorParameter {
                    param: param.name.clone(),
                });
            }
            if symbol.is_function() {
                return Err(SkipReason::FunctionParameter {
                    param: param.name.clone(),
                    ty: symbol.canonical.clone(),
                });
            }
            if !symbol.is_boundary() {
                return Err(unsupported(symbol));
            }
        }
        Ok(())
    }

    /// Translates a free function, constructor, or method.
    pub fn translate(
        &self,
        func: &Func,
        kind: CallKind,
        owner: Option<Owner<'_>>,
    ) -> Result<CallBinding, TranslateError> {
        self.check_signature(func)?;

        let (export_name, receiver, target) = match owner {
            Some(owner) => {
                let receiver = self.symbol(owner.symbol);
                let target = if receiver.is_interface() {
                    NativeTarget::TraitMethod {
                        trait_path: format!("{}::{}", self.package_path, owner.name),
                        name: rust_ident(&func.native_name),
                    }
                } else {
                    NativeTarget::Method {
                        name: rust_ident(&func.native_name),
                    }
                };
                (
                    format!("{}_{}", owner.name, func.name),
                    Some(self.value(owner.symbol, &func.name)?),
                    target,
                )
            }
            None => (
                export_name(&func.name),
                None,
                NativeTarget::Function {
                    path: format!("{}::{}", self.package_path, rust_ident(&func.native_name)),
                },
            ),
        };

        let params = func
            .params
            .iter()
            .map(|param| {
                Ok(ParamBinding {
                    name: binding_param_name(&param.name, &self.extension_module),
                    value: self.value(param.symbol, &func.name)?,
                })
            })
            .collect::<Result<Vec<_>, GenError>>()?;

        let result = match func.results.first() {
            Some(id) if !self.symbol(*id).is_error() => Some(self.value(*id, &func.name)?),
            _ => None,
        };

        Ok(CallBinding {
            kind,
            export_name,
            host_name: escape_python_keyword(&func.name),
            doc: func.doc.clone(),
            receiver,
            params,
            result,
            raises: func.err,
            target,
        })
    }

    /// Read-only accessor `<Type>_<Field>_Get` for a struct field.
    pub fn field_getter(&self, owner: Owner<'_>, field: &Field) -> Result<CallBinding, TranslateError> {
        let symbol = self.symbol(field.symbol);
        if symbol.is_interface() || !symbol.is_boundary() {
            return Err(unsupported(symbol).into());
        }
        Ok(CallBinding {
            kind: CallKind::FieldGetter,
            export_name: format!("{}_{}_Get", owner.name, field.name),
            host_name: escape_python_keyword(&field.name),
            doc: field.doc.clone(),
            receiver: Some(self.value(owner.symbol, &field.name)?),
            params: Vec::new(),
            result: Some(self.value(field.symbol, &field.name)?),
            raises: false,
            target: NativeTarget::Field {
                name: rust_ident(&field.name),
            },
        })
    }

    /// Accessor pair for a package variable; handle-backed variables are read-only.
    pub fn variable(&self, var: &Var) -> Result<VarBinding, TranslateError> {
        let symbol = self.symbol(var.symbol);
        if symbol.is_interface() || !symbol.is_boundary() {
            return Err(unsupported(symbol).into());
        }
        let path = format!("{}::{}", self.package_path, rust_ident(&var.native_name));
        let getter = CallBinding {
            kind: CallKind::VarGetter,
            export_name: format!("{}_Get", var.name),
            host_name: format!("{}_Get", var.name),
            doc: var.doc.clone(),
            receiver: None,
            params: Vec::new(),
            result: Some(self.value(var.symbol, &var.name)?),
            raises: false,
            target: NativeTarget::VarRead { path: path.clone() },
        };
        let setter = if symbol.requires_handle {
            None
        } else {
            let mut value = self.value(var.symbol, &var.name)?;
            value.pass = PassMode::Value;
            Some(CallBinding {
                kind: CallKind::VarSetter,
                export_name: format!("{}_Set", var.name),
                host_name: format!("{}_Set", var.name),
                doc: var.doc.clone(),
                receiver: None,
                params: vec![ParamBinding {
                    name: "value".to_string(),
                    value,
                }],
                result: None,
                raises: false,
                target: NativeTarget::VarWrite { path },
            })
        };
        Ok(VarBinding {
            name: var.name.clone(),
            doc: var.doc.clone(),
            getter,
            setter,
        })
    }

    fn value(&self, id: SymbolId, context: &str) -> Result<ValueBinding, GenError> {
        let symbol = self.symbol(id);
        let missing = || GenError::MissingConversion {
            func: context.to_string(),
            symbol: symbol.canonical.clone(),
        };
        let shim_type = symbol.shim_type.ok_or_else(missing)?;
        let host_tag = symbol.host_tag.clone().ok_or_else(missing)?;
        let zero_value = symbol
            .zero_value
            .clone()
            .ok_or_else(|| GenError::MissingZeroValue {
                symbol: symbol.canonical.clone(),
            })?;
        Ok(ValueBinding {
            native_type: symbol.native_name.clone(),
            kind: symbol.kind,
            shim_type,
            host_tag,
            to_host: symbol.to_host.clone(),
            from_host: symbol.from_host.clone(),
            zero_value,
            host_class: symbol.host_class.clone(),
            pass: pass_mode(symbol.kind),
        })
    }
}

fn pass_mode(kind: SymbolKind) -> PassMode {
    match kind {
        SymbolKind::Struct | SymbolKind::Pointer => PassMode::Deref,
        SymbolKind::Interface => PassMode::DerefDyn,
        SymbolKind::Basic(ScalarType::Text) => PassMode::Borrow,
        _ => PassMode::Value,
    }
}

fn unsupported(symbol: &Symbol) -> SkipReason {
    SkipReason::Unsupported {
        ty: symbol.canonical.clone(),
        kind: symbol.kind.tag().to_string(),
    }
}

/// The three per-call fragments, rendered standalone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFragments {
    pub shim: String,
    pub declaration: String,
    pub wrapper: String,
}

/// Renders one call into each stream for inspection and tests.
pub fn translate_fragments(call: &CallBinding, extension_module: &str) -> CallFragments {
    CallFragments {
        shim: crate::codegen::shim::render_call(call),
        declaration: crate::codegen::pybuild::render_call(call),
        wrapper: crate::codegen::pywrap::render_call(call, extension_module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use hostbind_types::PackageFile;

    fn package() -> Package {
        let file: PackageFile = serde_yml::from_str(
            r#"
package: { path: shapes, name: shapes }
types:
  - name: Foo
    kind:
      struct:
        fields:
          - { name: value, type: i64 }
          - { name: tags, type: "Vec<String>" }
        methods:
          - { name: Get, native-name: get, results: [i64] }
  - name: Shape
    kind:
      interface:
        methods:
          - { name: Area, native-name: area, results: [f64] }
functions:
  - { name: Three, results: [i64, i64, error] }
  - { name: Pair, results: [i64, i64] }
  - { name: ErrFirst, results: [error, i64] }
  - { name: TakesErr, params: [{ name: e, type: error }] }
  - { name: TakesFn, params: [{ name: cb, type: "fn(i64)" }] }
  - { name: GivesFn, results: ["fn()"] }
  - { name: TakesVec, params: [{ name: v, type: "Vec<i64>" }] }
  - { name: Divide, native-name: divide, params: [{ name: a, type: i64 }, { name: lambda, type: i64 }], results: [i64, error] }
  - { name: Touch, params: [{ name: foo, type: Foo }, { name: s, type: Shape }] }
variables:
  - { name: Counter, native-name: COUNTER, type: i64 }
  - { name: Origin, native-name: ORIGIN, type: Foo }
  - { name: Current, native-name: CURRENT, type: Shape }
"#,
        )
        .unwrap();
        Package::analyze(&file, &GenConfig::default())
    }

    fn func<'p>(package: &'p Package, name: &str) -> &'p Func {
        package.funcs.iter().find(|f| f.name == name).unwrap()
    }

    fn skip_reason(package: &Package, name: &str) -> SkipReason {
        let translator = SignatureTranslator::new(package);
        match translator.translate(func(package, name), CallKind::Function, None) {
            Err(TranslateError::Skip(reason)) => reason,
            other => panic!("{} should be skipped, got {:?}", name, other),
        }
    }

    #[test]
    fn test_skip_laws() {
        let package = package();
        assert_eq!(skip_reason(&package, "Three"), SkipReason::TooManyResults { count: 3 });
        assert_eq!(
            skip_reason(&package, "Pair"),
            SkipReason::SecondResultNotError { found: "i64".into() }
        );
        assert_eq!(skip_reason(&package, "ErrFirst"), SkipReason::ErrorNotLast);
        assert_eq!(
            skip_reason(&package, "TakesErr"),
            SkipReason::ErrorParameter { param: "e".into() }
        );
        assert!(matches!(
            skip_reason(&package, "TakesFn"),
            SkipReason::FunctionParameter { .. }
        ));
        assert!(matches!(
            skip_reason(&package, "GivesFn"),
            SkipReason::FunctionResult { .. }
        ));
        assert_eq!(
            skip_reason(&package, "TakesVec"),
            SkipReason::Unsupported {
                ty: "Vec<i64>".into(),
                kind: "slice".into()
            }
        );
    }

    #[test]
    fn test_error_result_is_raising_call() {
        let package = package();
        let translator = SignatureTranslator::new(&package);
        let call = translator
            .translate(func(&package, "Divide"), CallKind::Function, None)
            .unwrap();
        assert!(call.raises);
        assert_eq!(call.result.as_ref().unwrap().host_tag, "int64_t");
        assert_eq!(call.params[1].name, "lambda_");
        assert_eq!(
            call.target,
            NativeTarget::Function {
                path: "shapes::divide".into()
            }
        );
    }

    #[test]
    fn test_methods_are_namespaced_by_type() {
        let package = package();
        let translator = SignatureTranslator::new(&package);
        let foo = &package.structs[0];
        let owner = Owner {
            name: &foo.name,
            symbol: foo.symbol,
        };
        let call = translator
            .translate(&foo.methods[0], CallKind::Method, Some(owner))
            .unwrap();
        assert_eq!(call.export_name, "Foo_Get");
        assert_eq!(call.host_name, "Get");
        assert_eq!(call.receiver.as_ref().unwrap().pass, PassMode::Deref);

        let shape = &package.interfaces[0];
        let owner = Owner {
            name: &shape.name,
            symbol: shape.symbol,
        };
        let call = translator
            .translate(&shape.methods[0], CallKind::Method, Some(owner))
            .unwrap();
        assert_eq!(call.export_name, "Shape_Area");
        assert_eq!(
            call.target,
            NativeTarget::TraitMethod {
                trait_path: "shapes::Shape".into(),
                name: "area".into()
            }
        );
    }

    #[test]
    fn test_handle_params_pass_by_reference() {
        let package = package();
        let translator = SignatureTranslator::new(&package);
        let call = translator
            .translate(func(&package, "Touch"), CallKind::Function, None)
            .unwrap();
        assert_eq!(call.params[0].value.pass, PassMode::Deref);
        assert_eq!(call.params[1].value.pass, PassMode::DerefDyn);
        assert!(call.needs_registry());
        assert!(call.result.is_none());
    }

    #[test]
    fn test_field_getters_skip_unsupported_fields() {
        let package = package();
        let translator = SignatureTranslator::new(&package);
        let foo = &package.structs[0];
        let owner = Owner {
            name: &foo.name,
            symbol: foo.symbol,
        };
        let getter = translator.field_getter(owner, &foo.fields[0]).unwrap();
        assert_eq!(getter.export_name, "Foo_value_Get");
        assert!(matches!(
            translator.field_getter(owner, &foo.fields[1]),
            Err(TranslateError::Skip(SkipReason::Unsupported { .. }))
        ));
    }

    #[test]
    fn test_variables() {
        let package = package();
        let translator = SignatureTranslator::new(&package);
        let counter = translator.variable(&package.vars[0]).unwrap();
        assert_eq!(counter.getter.export_name, "Counter_Get");
        let setter = counter.setter.unwrap();
        assert_eq!(setter.export_name, "Counter_Set");
        assert_eq!(
            setter.target,
            NativeTarget::VarWrite {
                path: "shapes::COUNTER".into()
            }
        );

        let origin = translator.variable(&package.vars[1]).unwrap();
        assert!(origin.setter.is_none());
        assert!(origin.getter.result.unwrap().is_handle());

        assert!(matches!(
            translator.variable(&package.vars[2]),
            Err(TranslateError::Skip(SkipReason::Unsupported { .. }))
        ));
    }
}
