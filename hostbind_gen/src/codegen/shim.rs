//! Native shim stream: a standalone Rust source exporting `extern "C"` entry
//! points that resolve handles, convert arguments, call the package, and
//! convert results.

use crate::codegen::shared::ir::*;
use crate::codegen::shared::printer::Printer;
use crate::codegen::shared::stream::{StreamRenderer, fill_template};
use crate::runtime::{CONVERT_SOURCE, HANDLES_SOURCE};

const SHIM_HEADER: &str = r#"// Rust shims for package {path}.
// File is generated by hostbind. Do not edit.
// {regen}
//
// Handle representation: native {native}, shim {shim}, host {host}.

#![allow(non_snake_case, dead_code, unused_imports, unused_variables, clippy::all)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_longlong};
use std::sync::{Arc, OnceLock};

type CHandle = {shim};
"#;

const SHIM_SUPPORT: &str = r#"
use handles::{Handle, HandleRegistry};
use convert::{bool_to_c, c_to_bool, c_to_string, error_message, string_to_c};

static REGISTRY: OnceLock<HandleRegistry> = OnceLock::new();

// hb_registry returns the process-wide handle table shared by every entry point.
fn hb_registry() -> &'static HandleRegistry {
    REGISTRY.get_or_init(HandleRegistry::new)
}

#[repr(C)]
pub struct PyObject {
    _private: [u8; 0],
}

extern "C" {
    static PyExc_RuntimeError: *mut PyObject;
    fn PyErr_SetString(exception: *mut PyObject, message: *const c_char);
}

// hb_raise sets a pending RuntimeError; the extension checks PyErr_Occurred
// after the call returns.
fn hb_raise(message: &str) {
    let message = error_message(message);
    unsafe { PyErr_SetString(PyExc_RuntimeError, message.as_ptr()) };
}

#[no_mangle]
pub extern "C" fn IncRef(handle: CHandle) {
    let _ = hb_registry().retain(handle as Handle);
}

#[no_mangle]
pub extern "C" fn DecRef(handle: CHandle) {
    let _ = hb_registry().release(handle as Handle);
}

// --- generated code for package: {name} below: ---
"#;

pub struct ShimRenderer {
    p: Printer,
}

impl ShimRenderer {
    pub fn new() -> Self {
        Self {
            p: Printer::new("    "),
        }
    }
}

impl Default for ShimRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRenderer for ShimRenderer {
    fn preamble(&mut self, ir: &BindingIr) {
        let values = [
            ("path", ir.package.path.as_str()),
            ("name", ir.package.name.as_str()),
            ("regen", ir.regenerate_command.as_str()),
            ("native", ir.handle.native.as_str()),
            ("shim", ir.handle.shim.as_str()),
            ("host", ir.handle.host.as_str()),
        ];
        self.p.raw(&fill_template(SHIM_HEADER, &values));
        self.p.blank();
        self.p.raw("mod handles {\n");
        self.p.raw(HANDLES_SOURCE);
        self.p.raw("}\n\nmod convert {\n");
        self.p.raw(CONVERT_SOURCE);
        self.p.raw("}\n");
        self.p.raw(&fill_template(SHIM_SUPPORT, &values));
        self.p.blank();
    }

    fn section(&mut self, section: Section) {
        self.p.line(format!("// ---- {} ---", section.title()));
        self.p.blank();
    }

    fn handle_type(&mut self, binding: &HandleTypeBinding) {
        let p = &mut self.p;
        p.line(format!(
            "// {} crosses as a handle to host class {}",
            binding.native_type, binding.host_class
        ));
        let value = match binding.kind {
            crate::model::SymbolKind::Pointer => "*value",
            _ => "value",
        };
        p.line(format!(
            "fn {}(registry: &HandleRegistry, value: {}) -> CHandle {{",
            binding.to_handle, binding.native_type
        ));
        p.indent();
        p.line(format!("registry.allocate({}) as CHandle", value));
        p.outdent();
        p.line("}");
        p.blank();

        if let Some(from_handle) = &binding.from_handle {
            p.line(format!(
                "fn {}(registry: &HandleRegistry, handle: CHandle) -> Result<Arc<{}>, handles::HandleError> {{",
                from_handle, binding.stored_type
            ));
            p.indent();
            p.line(format!(
                "registry.resolve::<{}>(handle as Handle)",
                binding.stored_type
            ));
            p.outdent();
            p.line("}");
            p.blank();
        }
    }

    fn variable(&mut self, binding: &VarBinding) {
        emit_call(&mut self.p, &binding.getter);
        if let Some(setter) = &binding.setter {
            emit_call(&mut self.p, setter);
        }
    }

    fn class(&mut self, binding: &ClassBinding) {
        for call in binding.methods.iter().chain(&binding.properties) {
            emit_call(&mut self.p, call);
        }
    }

    fn call(&mut self, binding: &CallBinding) {
        emit_call(&mut self.p, binding);
    }

    fn finish(self) -> String {
        self.p.finish()
    }
}

/// Renders the shim fragment of a single call.
pub fn render_call(call: &CallBinding) -> String {
    let mut p = Printer::new("    ");
    emit_call(&mut p, call);
    p.finish()
}

fn emit_call(p: &mut Printer, call: &CallBinding) {
    if let Some(doc) = &call.doc {
        for line in doc.lines() {
            p.line(format!("// {}", line).trim_end());
        }
    }

    let mut params = Vec::new();
    if call.receiver.is_some() {
        params.push("_handle: CHandle".to_string());
    }
    params.extend(
        call.params
            .iter()
            .map(|param| format!("{}: {}", param.name, param.value.shim_type.rust_decl())),
    );
    let ret = call
        .result
        .as_ref()
        .map(|result| format!(" -> {}", result.shim_type.rust_decl()))
        .unwrap_or_default();

    p.line("#[no_mangle]");
    p.line(format!(
        "pub extern \"C\" fn {}({}){} {{",
        call.export_name,
        params.join(", "),
        ret
    ));
    p.indent();

    let early = match &call.result {
        Some(result) => format!("return {}", result.zero_value),
        None => "return".to_string(),
    };

    if call.needs_registry() {
        p.line("let hb_reg = hb_registry();");
    }
    if let Some(receiver) = &call.receiver {
        emit_resolve(p, "hb_recv", "_handle", receiver, &early);
    }
    for param in &call.params {
        if param.value.is_handle() {
            emit_resolve(p, &param.name, &param.name, &param.value, &early);
        } else if let Some(from_host) = &param.value.from_host {
            p.line(format!("let {0} = {1}({0});", param.name, from_host));
        }
    }

    match &call.target {
        NativeTarget::VarRead { path } => {
            p.line(format!(
                "let hb_guard = {}.read().unwrap_or_else(|hb_poison| hb_poison.into_inner());",
                path
            ));
            p.line(convert_result(call.result.as_ref(), "(*hb_guard).clone()"));
        }
        NativeTarget::VarWrite { path } => {
            let value = call
                .params
                .first()
                .map(|param| param.name.as_str())
                .unwrap_or("value");
            p.line(format!(
                "let mut hb_guard = {}.write().unwrap_or_else(|hb_poison| hb_poison.into_inner());",
                path
            ));
            p.line(format!("*hb_guard = {};", value));
        }
        _ => emit_invoke(p, call),
    }

    p.outdent();
    p.line("}");
    p.blank();
}

/* Resolve a handle into `local`, leaving the function with its zero value on a miss */
fn emit_resolve(p: &mut Printer, local: &str, source: &str, value: &ValueBinding, early: &str) {
    let from_handle = value.from_host.as_deref().unwrap_or("resolve");
    p.line(format!("let {} = match {}(hb_reg, {}) {{", local, from_handle, source));
    p.indent();
    p.line("Ok(value) => value,");
    p.line(format!("Err(_) => {},", early));
    p.outdent();
    p.line("};");
}

fn emit_invoke(p: &mut Printer, call: &CallBinding) {
    let invoke = call_expr(call);
    match (&call.result, call.raises) {
        (None, false) => p.line(format!("{};", invoke)),
        (Some(result), false) => p.line(convert_result(Some(result), &invoke)),
        (None, true) => {
            p.line(format!("if let Err(hb_err) = {} {{", invoke));
            p.indent();
            p.line("hb_raise(&hb_err.to_string());");
            p.outdent();
            p.line("}");
        }
        (Some(result), true) => {
            p.line(format!("match {} {{", invoke));
            p.indent();
            p.line(format!("Ok(hb_ret) => {},", convert_result(Some(result), "hb_ret")));
            p.line("Err(hb_err) => {");
            p.indent();
            p.line("hb_raise(&hb_err.to_string());");
            p.line(&result.zero_value);
            p.outdent();
            p.line("}");
            p.outdent();
            p.line("}");
        }
    }
}

fn call_expr(call: &CallBinding) -> String {
    let args: Vec<String> = call
        .params
        .iter()
        .map(|param| match param.value.pass {
            PassMode::Value => param.name.clone(),
            PassMode::Borrow => format!("&{}", param.name),
            PassMode::Deref => format!("&*{}", param.name),
            PassMode::DerefDyn => format!("&**{}", param.name),
        })
        .collect();
    match &call.target {
        NativeTarget::Function { path } => format!("{}({})", path, args.join(", ")),
        NativeTarget::Method { name } => format!("hb_recv.{}({})", name, args.join(", ")),
        NativeTarget::TraitMethod { trait_path, name } => {
            let mut all = vec!["&**hb_recv".to_string()];
            all.extend(args);
            format!("{}::{}({})", trait_path, name, all.join(", "))
        }
        NativeTarget::Field { name } => format!("hb_recv.{}.clone()", name),
        NativeTarget::VarRead { path } | NativeTarget::VarWrite { path } => path.clone(),
    }
}

fn convert_result(result: Option<&ValueBinding>, expr: &str) -> String {
    match result {
        Some(result) => match &result.to_host {
            Some(to_host) if result.is_handle() => format!("{}(hb_reg, {})", to_host, expr),
            Some(to_host) => format!("{}({})", to_host, expr),
            None => expr.to_string(),
        },
        None => expr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShimType, SymbolKind};
    use hostbind_types::ScalarType;

    fn int64() -> ValueBinding {
        ValueBinding {
            native_type: "i64".into(),
            kind: SymbolKind::Basic(ScalarType::I64),
            shim_type: ShimType::I64,
            host_tag: "int64_t".into(),
            to_host: None,
            from_host: None,
            zero_value: "0".into(),
            host_class: None,
            pass: PassMode::Value,
        }
    }

    fn foo_handle() -> ValueBinding {
        ValueBinding {
            native_type: "shapes::Foo".into(),
            kind: SymbolKind::Struct,
            shim_type: ShimType::Handle,
            host_tag: "int64_t".into(),
            to_host: Some("foo_to_handle".into()),
            from_host: Some("foo_from_handle".into()),
            zero_value: "0".into(),
            host_class: Some("Foo".into()),
            pass: PassMode::Deref,
        }
    }

    #[test]
    fn test_method_resolves_receiver_before_call() {
        let call = CallBinding {
            kind: CallKind::Method,
            export_name: "Foo_Get".into(),
            host_name: "Get".into(),
            doc: None,
            receiver: Some(foo_handle()),
            params: vec![],
            result: Some(int64()),
            raises: false,
            target: NativeTarget::Method { name: "get".into() },
        };
        let text = render_call(&call);
        let expected = "#[no_mangle]
pub extern \"C\" fn Foo_Get(_handle: CHandle) -> i64 {
    let hb_reg = hb_registry();
    let hb_recv = match foo_from_handle(hb_reg, _handle) {
        Ok(value) => value,
        Err(_) => return 0,
    };
    hb_recv.get()
}

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_raising_function_matches_on_result() {
        let call = CallBinding {
            kind: CallKind::Function,
            export_name: "Divide".into(),
            host_name: "Divide".into(),
            doc: Some("Divide a by b.".into()),
            receiver: None,
            params: vec![
                ParamBinding { name: "a".into(), value: int64() },
                ParamBinding { name: "b".into(), value: int64() },
            ],
            result: Some(int64()),
            raises: true,
            target: NativeTarget::Function {
                path: "shapes::divide".into(),
            },
        };
        let text = render_call(&call);
        let expected = "// Divide a by b.
#[no_mangle]
pub extern \"C\" fn Divide(a: i64, b: i64) -> i64 {
    match shapes::divide(a, b) {
        Ok(hb_ret) => hb_ret,
        Err(hb_err) => {
            hb_raise(&hb_err.to_string());
            0
        }
    }
}

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_handle_params_and_results_use_registry() {
        let mut shape = foo_handle();
        shape.kind = SymbolKind::Interface;
        shape.from_host = Some("shape_from_handle".into());
        shape.pass = PassMode::DerefDyn;
        let call = CallBinding {
            kind: CallKind::Function,
            export_name: "Wrap".into(),
            host_name: "Wrap".into(),
            doc: None,
            receiver: None,
            params: vec![ParamBinding { name: "s".into(), value: shape }],
            result: Some(foo_handle()),
            raises: false,
            target: NativeTarget::Function { path: "shapes::wrap".into() },
        };
        let text = render_call(&call);
        assert!(text.contains("let s = match shape_from_handle(hb_reg, s) {"));
        assert!(text.contains("    foo_to_handle(hb_reg, shapes::wrap(&**s))\n"));
    }

    #[test]
    fn test_variable_accessors_recover_poisoned_locks() {
        let getter = CallBinding {
            kind: CallKind::VarGetter,
            export_name: "Counter_Get".into(),
            host_name: "Counter_Get".into(),
            doc: None,
            receiver: None,
            params: vec![],
            result: Some(int64()),
            raises: false,
            target: NativeTarget::VarRead { path: "shapes::COUNTER".into() },
        };
        assert_eq!(
            render_call(&getter),
            "#[no_mangle]
pub extern \"C\" fn Counter_Get() -> i64 {
    let hb_guard = shapes::COUNTER.read().unwrap_or_else(|hb_poison| hb_poison.into_inner());
    (*hb_guard).clone()
}

"
        );

        let setter = CallBinding {
            kind: CallKind::VarSetter,
            export_name: "Counter_Set".into(),
            host_name: "Counter_Set".into(),
            doc: None,
            receiver: None,
            params: vec![ParamBinding { name: "value".into(), value: int64() }],
            result: None,
            raises: false,
            target: NativeTarget::VarWrite { path: "shapes::COUNTER".into() },
        };
        let text = render_call(&setter);
        assert!(text.contains(
            "    let mut hb_guard = shapes::COUNTER.write().unwrap_or_else(|hb_poison| hb_poison.into_inner());\n    *hb_guard = value;\n}\n"
        ));
        assert!(!text.contains("if let Ok"));
    }

    #[test]
    fn test_preamble_embeds_runtime_modules() {
        let ir = BindingIr::new(
            PackageIdentity { path: "shapes".into(), name: "shapes".into(), doc: None },
            crate::config::HandleRepr::default(),
            "hostbind gen --vm=python3 -f shapes.yaml".into(),
        );
        let text = crate::codegen::shared::stream::render(&ir, ShimRenderer::new());
        assert!(text.contains("mod convert {\n//! Value conversions at the C boundary."));
        assert!(text.contains("use convert::{bool_to_c, c_to_bool, c_to_string, error_message, string_to_c};"));
        assert!(text.contains("let message = error_message(message);"));
        assert_eq!(text.matches("fn c_to_bool(").count(), 1);
    }
}
