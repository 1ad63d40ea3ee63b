use super::ir::*;
use super::names::{ClassScope, NameRegistry};
use super::translator::{Owner, SignatureTranslator, TranslateError};
use crate::config::GenConfig;
use crate::errors::{Diagnostic, GenError, SkipReason};
use crate::model::{Func, Package, Symbol, SymbolKind};
use hostbind_types::ScalarType;
use tracing::{debug, info, warn};

/// Lowers an analyzed package into the binding IR in fixed section order.
pub struct IrBuilder<'a> {
    package: &'a Package,
    translator: SignatureTranslator<'a>,
    names: NameRegistry,
    ir: BindingIr,
}

impl<'a> IrBuilder<'a> {
    pub fn new(package: &'a Package, config: &GenConfig, regenerate_command: String) -> Self {
        let identity = PackageIdentity {
            path: package.path.clone(),
            name: package.name.clone(),
            doc: package.doc.clone(),
        };
        let names = NameRegistry::new(&identity.extension_module());
        Self {
            package,
            translator: SignatureTranslator::new(package),
            names,
            ir: BindingIr::new(identity, config.handle.clone(), regenerate_command),
        }
    }

    pub fn build(mut self) -> Result<BindingIr, GenError> {
        self.ir
            .diagnostics
            .extend(self.package.diagnostics.iter().cloned());

        for section in Section::ORDER {
            self.ir.items.push(BindingItem::Section(section));
            match section {
                Section::Types => self.types(),
                Section::Constants => self.constants(),
                Section::Variables => self.variables()?,
                Section::Interfaces => self.interfaces()?,
                Section::Structs => self.structs()?,
                Section::Constructors => self.constructors()?,
                Section::Functions => self.functions()?,
            }
        }

        info!(
            package = %self.ir.package.path,
            calls = self.ir.calls().len(),
            skipped = self.ir.diagnostics.len(),
            "built binding IR"
        );
        Ok(self.ir)
    }

    fn skip(&mut self, symbol: &str, reason: SkipReason) {
        warn!(symbol = %symbol, reason = %reason, "skipping");
        self.ir.diagnostics.push(Diagnostic::new(symbol, reason));
    }

    /* Skips are recorded and swallowed; fatal errors propagate */
    fn accept<T>(&mut self, label: &str, result: Result<T, TranslateError>) -> Result<Option<T>, GenError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(TranslateError::Skip(reason)) => {
                self.skip(label, reason);
                Ok(None)
            }
            Err(TranslateError::Fatal(err)) => Err(err),
        }
    }

    fn types(&mut self) {
        let package = self.package;
        for symbol in package.symbols.iter().filter(|s| s.requires_handle) {
            let (Some(stored_type), Some(host_class), Some(to_handle)) = (
                symbol.stored_type.clone(),
                symbol.host_class.clone(),
                symbol.to_host.clone(),
            ) else {
                continue;
            };
            let from_handle = match symbol.kind {
                SymbolKind::Pointer => None,
                _ => symbol.from_host.clone(),
            };
            debug!(ty = %symbol.canonical, "handle type");
            self.ir.items.push(BindingItem::HandleType(HandleTypeBinding {
                kind: symbol.kind,
                native_type: symbol.native_name.clone(),
                stored_type,
                host_class,
                to_handle,
                from_handle,
            }));
        }
    }

    fn constants(&mut self) {
        let package = self.package;
        for constant in &package.consts {
            let symbol = package.symbol(constant.symbol);
            let literal = host_literal(symbol, &constant.value)
                .and_then(|literal| self.names.claim_host(&constant.name).map(|_| literal));
            match literal {
                Ok(literal) => self.ir.items.push(BindingItem::Constant(ConstBinding {
                    name: constant.name.clone(),
                    doc: constant.doc.clone(),
                    literal,
                })),
                Err(reason) => self.skip(&constant.name, reason),
            }
        }
    }

    fn variables(&mut self) -> Result<(), GenError> {
        let package = self.package;
        for var in &package.vars {
            let translated = self.translator.variable(var);
            let Some(binding) = self.accept(&var.name, translated)? else {
                continue;
            };
            let mut claimed = self
                .names
                .claim_call(&binding.getter.export_name, &binding.getter.host_name);
            if claimed.is_ok() {
                if let Some(setter) = &binding.setter {
                    claimed = self.names.claim_call(&setter.export_name, &setter.host_name);
                }
            }
            match claimed {
                Ok(()) => {
                    debug!(var = %var.name, "variable");
                    self.ir.items.push(BindingItem::Variable(binding));
                }
                Err(reason) => self.skip(&var.name, reason),
            }
        }
        Ok(())
    }

    fn interfaces(&mut self) -> Result<(), GenError> {
        let package = self.package;
        for iface in &package.interfaces {
            if let Err(reason) = self.names.claim_host(&iface.name) {
                self.skip(&iface.name, reason);
                continue;
            }
            let owner = Owner {
                name: &iface.name,
                symbol: iface.symbol,
            };
            let mut scope = ClassScope::default();
            let methods = self.methods(owner, &iface.methods, &mut scope)?;
            let stored_type = self.stored_type(iface.symbol);
            self.ir.items.push(BindingItem::Class(ClassBinding {
                name: iface.name.clone(),
                kind: ClassKind::Interface,
                doc: iface.doc.clone(),
                stored_type,
                properties: Vec::new(),
                methods,
            }));
        }
        Ok(())
    }

    fn structs(&mut self) -> Result<(), GenError> {
        let package = self.package;
        for st in &package.structs {
            if let Err(reason) = self.names.claim_host(&st.name) {
                self.skip(&st.name, reason);
                continue;
            }
            let owner = Owner {
                name: &st.name,
                symbol: st.symbol,
            };
            let mut scope = ClassScope::default();
            /* methods claim member names before fields */
            let methods = self.methods(owner, &st.methods, &mut scope)?;

            let mut properties = Vec::new();
            for field in &st.fields {
                let label = format!("{}.{}", st.name, field.name);
                let translated = self.translator.field_getter(owner, field);
                let Some(getter) = self.accept(&label, translated)? else {
                    continue;
                };
                match self
                    .names
                    .claim_member(&mut scope, &getter.export_name, &getter.host_name)
                {
                    Ok(()) => properties.push(getter),
                    Err(reason) => self.skip(&label, reason),
                }
            }

            let stored_type = self.stored_type(st.symbol);
            self.ir.items.push(BindingItem::Class(ClassBinding {
                name: st.name.clone(),
                kind: ClassKind::Struct,
                doc: st.doc.clone(),
                stored_type,
                properties,
                methods,
            }));
        }
        Ok(())
    }

    fn methods(
        &mut self,
        owner: Owner<'_>,
        methods: &[Func],
        scope: &mut ClassScope,
    ) -> Result<Vec<CallBinding>, GenError> {
        let mut calls = Vec::new();
        for method in methods {
            let label = format!("{}.{}", owner.name, method.name);
            let translated = self.translator.translate(method, CallKind::Method, Some(owner));
            let Some(call) = self.accept(&label, translated)? else {
                continue;
            };
            match self.names.claim_member(scope, &call.export_name, &call.host_name) {
                Ok(()) => {
                    debug!(export = %call.export_name, "method");
                    calls.push(call);
                }
                Err(reason) => self.skip(&label, reason),
            }
        }
        Ok(calls)
    }

    fn constructors(&mut self) -> Result<(), GenError> {
        let package = self.package;
        for st in &package.structs {
            for ctor in &st.ctors {
                self.module_call(ctor, CallKind::Constructor)?;
            }
        }
        Ok(())
    }

    fn functions(&mut self) -> Result<(), GenError> {
        let package = self.package;
        for func in &package.funcs {
            self.module_call(func, CallKind::Function)?;
        }
        Ok(())
    }

    fn module_call(&mut self, func: &Func, kind: CallKind) -> Result<(), GenError> {
        let translated = self.translator.translate(func, kind, None);
        let Some(call) = self.accept(&func.name, translated)? else {
            return Ok(());
        };
        match self.names.claim_call(&call.export_name, &call.host_name) {
            Ok(()) => {
                debug!(export = %call.export_name, kind = ?kind, "call");
                self.ir.items.push(BindingItem::Call(call));
            }
            Err(reason) => self.skip(&func.name, reason),
        }
        Ok(())
    }

    fn stored_type(&self, symbol: crate::model::SymbolId) -> String {
        let symbol = self.package.symbol(symbol);
        symbol
            .stored_type
            .clone()
            .unwrap_or_else(|| symbol.native_name.clone())
    }
}

/// Converts a constant's native literal into host syntax.
pub fn host_literal(symbol: &Symbol, value: &str) -> Result<String, SkipReason> {
    let invalid = || SkipReason::InvalidConstant {
        value: value.to_string(),
        ty: symbol.canonical.clone(),
    };
    let trimmed = value.trim();
    match symbol.kind {
        SymbolKind::Basic(ScalarType::Bool) => match trimmed {
            "true" => Ok("True".to_string()),
            "false" => Ok("False".to_string()),
            _ => Err(invalid()),
        },
        SymbolKind::Basic(ScalarType::Text) => Ok(python_string_literal(value)),
        SymbolKind::Basic(scalar) if scalar.is_float() => {
            let digits = trimmed.replace('_', "");
            match digits.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(digits),
                _ => Err(invalid()),
            }
        }
        SymbolKind::Basic(_) => {
            let digits = trimmed.replace('_', "");
            let unsigned = digits.strip_prefix('-').unwrap_or(&digits);
            let valid = match unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
                Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
                None => digits.parse::<i128>().is_ok(),
            };
            if valid { Ok(digits) } else { Err(invalid()) }
        }
        _ => Err(SkipReason::Unsupported {
            ty: symbol.canonical.clone(),
            kind: symbol.kind.tag().to_string(),
        }),
    }
}

/// Single-quoted Python string literal.
pub fn python_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_types::PackageFile;

    fn build(yaml: &str) -> BindingIr {
        let file: PackageFile = serde_yml::from_str(yaml).unwrap();
        let config = GenConfig::default();
        let package = Package::analyze(&file, &config);
        IrBuilder::new(&package, &config, "regen".into())
            .build()
            .unwrap()
    }

    fn sections(ir: &BindingIr) -> Vec<Section> {
        ir.items
            .iter()
            .filter_map(|item| match item {
                BindingItem::Section(section) => Some(*section),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sections_always_in_fixed_order() {
        let ir = build("package: { path: p, name: p }\n");
        assert_eq!(sections(&ir), Section::ORDER.to_vec());
        assert_eq!(ir.items.len(), 7);
    }

    #[test]
    fn test_constant_literals() {
        let ir = build(
            r#"
package: { path: p, name: p }
constants:
  - { name: Pi, type: f64, value: "3.14159" }
  - { name: On, type: bool, value: "true" }
  - { name: Greeting, type: String, value: "it's" }
  - { name: Mask, type: u32, value: "0xFF" }
  - { name: Broken, type: i32, value: "abc" }
"#,
        );
        let literals: Vec<(&str, &str)> = ir
            .items
            .iter()
            .filter_map(|item| match item {
                BindingItem::Constant(c) => Some((c.name.as_str(), c.literal.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            literals,
            vec![
                ("Pi", "3.14159"),
                ("On", "True"),
                ("Greeting", "'it\\'s'"),
                ("Mask", "0xFF"),
            ]
        );
        assert_eq!(ir.diagnostics.len(), 1);
        assert_eq!(ir.diagnostics[0].symbol, "Broken");
    }

    #[test]
    fn test_colliding_later_items_are_skipped() {
        let ir = build(
            r#"
package: { path: p, name: p }
types:
  - name: Foo
    kind:
      struct:
        fields:
          - { name: Get, type: i64 }
        methods:
          - { name: Get, native-name: get, results: [i64] }
functions:
  - { name: Foo, native-name: foo }
  - { name: IncRef, native-name: inc_ref }
  - { name: Count, native-name: count, results: [i64] }
  - { name: Count, native-name: count2, results: [i64] }
"#,
        );
        let skipped: Vec<&str> = ir.diagnostics.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["Foo.Get", "Foo", "IncRef", "Count"]);
        assert!(ir.diagnostics.iter().all(|d| matches!(d.reason, SkipReason::NameCollision { .. })));

        let class = ir
            .items
            .iter()
            .find_map(|item| match item {
                BindingItem::Class(class) => Some(class),
                _ => None,
            })
            .unwrap();
        assert_eq!(class.methods.len(), 1);
        assert!(class.properties.is_empty());
    }

    #[test]
    fn test_handle_types_cover_structs_pointers_and_interfaces() {
        let ir = build(
            r#"
package: { path: p, name: p }
types:
  - { name: Foo, kind: { struct: {} } }
  - { name: Shape, kind: { interface: {} } }
functions:
  - { name: NewFoo, results: ["Box<Foo>"] }
"#,
        );
        let handles: Vec<&HandleTypeBinding> = ir
            .items
            .iter()
            .filter_map(|item| match item {
                BindingItem::HandleType(binding) => Some(binding),
                _ => None,
            })
            .collect();
        assert_eq!(handles.len(), 3);
        assert_eq!(handles[0].to_handle, "foo_to_handle");
        assert_eq!(handles[1].stored_type, "Box<dyn p::Shape + Send + Sync>");
        assert_eq!(handles[2].to_handle, "foo_ptr_to_handle");
        assert_eq!(handles[2].from_handle, None);

        let ctor = ir.calls().into_iter().find(|c| c.export_name == "NewFoo").unwrap();
        assert_eq!(ctor.kind, CallKind::Constructor);
    }

    #[test]
    fn test_python_string_literal_escapes() {
        assert_eq!(python_string_literal("a\\b\n"), "'a\\\\b\\n'");
        assert_eq!(python_string_literal("\u{1}"), "'\\x01'");
        assert_eq!(python_string_literal("héllo"), "'héllo'");
    }
}
