//! Host wrapper stream: the Python module users import. Classes wrap
//! handles; module functions forward to the extension `_<name>`.

use crate::codegen::shared::ir::*;
use crate::codegen::shared::printer::Printer;
use crate::codegen::shared::stream::{StreamRenderer, fill_template};

const WRAPPER_PREAMBLE: &str = r#"# python wrapper for package {path}
# This is what you import to use the package.
# File is generated by hostbind. Do not edit.
# {regen}

import {ext}


class NativeObject(object):
    """NativeObject is the base class of every wrapper class. Each instance
    owns one reference to a native handle and drops it when collected."""

    def __init__(self, handle):
        self.handle = handle

    def __del__(self):
        handle = getattr(self, 'handle', 0)
        if handle and {ext} is not None:
            {ext}.DecRef(handle)

    def __repr__(self):
        return '%s(handle=%d)' % (type(self).__name__, self.handle)

"#;

pub struct WrapperRenderer {
    p: Printer,
    ext: String,
}

impl WrapperRenderer {
    pub fn new(extension_module: &str) -> Self {
        Self {
            p: Printer::new("    "),
            ext: extension_module.to_string(),
        }
    }
}

impl StreamRenderer for WrapperRenderer {
    fn preamble(&mut self, ir: &BindingIr) {
        if let Some(doc) = &ir.package.doc {
            emit_docstring(&mut self.p, doc);
        }
        let text = fill_template(
            WRAPPER_PREAMBLE,
            &[
                ("path", ir.package.path.as_str()),
                ("regen", ir.regenerate_command.as_str()),
                ("ext", self.ext.as_str()),
            ],
        );
        self.p.raw(&text);
    }

    fn section(&mut self, section: Section) {
        self.p.blank();
        self.p.line(format!("# ---- {} ---", section.title()));
        self.p.blank();
    }

    fn constant(&mut self, binding: &ConstBinding) {
        if let Some(doc) = &binding.doc {
            for line in doc.lines() {
                self.p.line(format!("# {}", line).trim_end());
            }
        }
        self.p.line(format!("{} = {}", binding.name, binding.literal));
    }

    fn variable(&mut self, binding: &VarBinding) {
        emit_def(&mut self.p, &binding.getter, &self.ext);
        if let Some(setter) = &binding.setter {
            emit_def(&mut self.p, setter, &self.ext);
        }
    }

    fn class(&mut self, binding: &ClassBinding) {
        let p = &mut self.p;
        p.blank();
        p.line(format!("class {}(NativeObject):", binding.name));
        p.indent();
        let doc = binding.doc.clone().unwrap_or_else(|| match binding.kind {
            ClassKind::Struct => format!("{} wraps a handle to {}", binding.name, binding.stored_type),
            ClassKind::Interface => format!("{} wraps a handle to any implementation of {}", binding.name, binding.name),
        });
        emit_docstring(p, &doc);
        for call in binding.properties.iter().chain(&binding.methods) {
            p.blank();
            emit_def(p, call, &self.ext);
        }
        p.outdent();
        p.blank();
    }

    fn call(&mut self, binding: &CallBinding) {
        emit_def(&mut self.p, binding, &self.ext);
    }

    fn finish(self) -> String {
        self.p.finish()
    }
}

/// Renders the wrapper `def` of a single call at top level.
pub fn render_call(call: &CallBinding, extension_module: &str) -> String {
    let mut p = Printer::new("    ");
    emit_def(&mut p, call, extension_module);
    p.finish()
}

fn emit_def(p: &mut Printer, call: &CallBinding, ext: &str) {
    let mut params = Vec::new();
    let mut args = Vec::new();
    if call.receiver.is_some() {
        params.push("self".to_string());
        args.push("self.handle".to_string());
    }
    for param in &call.params {
        params.push(param.name.clone());
        if param.value.is_handle() {
            args.push(format!("{}.handle", param.name));
        } else {
            args.push(param.name.clone());
        }
    }

    if call.kind == CallKind::FieldGetter {
        p.line("@property");
    }
    p.line(format!("def {}({}):", call.host_name, params.join(", ")));
    p.indent();
    if let Some(doc) = &call.doc {
        emit_docstring(p, doc);
    }
    let invoke = format!("{}.{}({})", ext, call.export_name, args.join(", "));
    match &call.result {
        Some(result) => match &result.host_class {
            Some(class) => p.line(format!("return {}(handle={})", class, invoke)),
            None => p.line(format!("return {}", invoke)),
        },
        None => p.line(invoke),
    }
    p.outdent();
    if p.depth() == 0 {
        p.blank();
    }
}

fn emit_docstring(p: &mut Printer, doc: &str) {
    let doc = doc.trim().replace("\"\"\"", "\\\"\\\"\\\"");
    let mut lines = doc.lines();
    match (lines.next(), lines.next()) {
        (Some(only), None) => p.line(format!("\"\"\"{}\"\"\"", only)),
        _ => {
            p.line("\"\"\"");
            p.lines(&doc);
            p.line("\"\"\"");
        }
    }
}
