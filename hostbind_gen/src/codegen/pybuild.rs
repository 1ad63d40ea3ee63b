//! Binding-declaration stream: a pybindgen build script that declares every
//! shim entry point, writes the matching C prototype header, and generates
//! the CPython extension source.

use crate::codegen::shared::ir::*;
use crate::codegen::shared::printer::Printer;
use crate::codegen::shared::stream::{StreamRenderer, fill_template};

const BUILD_PREAMBLE: &str = r#"# python build stubs for package {path}
# File is generated by hostbind. Do not edit.
# {regen}

from pybindgen import retval, param, Function, Module
import sys

mod = Module('_{name}')
mod.add_include('"{name}_shim.h"')

# pybindgen tags whose C prototype spelling differs
C_TYPES = {'bool': 'char'}

_prototypes = []


class CheckedFunction(Function):
    """CheckedFunction raises the host exception left pending by the shim"""

    def __init__(self, *a, **kw):
        super(CheckedFunction, self).__init__(*a, **kw)
        self._failure_expression = ''
        self._failure_cleanup = ''

    def set_failure_expression(self, expr):
        self._failure_expression = expr

    def set_failure_cleanup(self, expr):
        self._failure_cleanup = expr

    def generate_call(self):
        super(CheckedFunction, self).generate_call()
        check = "PyErr_Occurred()"
        if self._failure_expression:
            check = "%s && %s" % (self._failure_expression, check)
        self.before_call.write_error_check(check, self._failure_cleanup or None)


def add_checked_function(mod, name, ret, params, failure_expression=''):
    func = CheckedFunction(name, ret, params)
    func.set_failure_expression(failure_expression)
    mod._add_function_obj(func)
    return func


def add_function(name, ret, params, checked=False):
    """add_function declares one shim entry point and records its C prototype"""
    c_ret = C_TYPES.get(ret, ret) if ret else 'void'
    c_params = ', '.join('%s %s' % (C_TYPES.get(t, t), n) for t, n in params) or 'void'
    _prototypes.append('%s %s(%s);' % (c_ret, name, c_params))
    rv = retval(ret) if ret else None
    ps = [param(t, n) for t, n in params]
    if checked:
        add_checked_function(mod, name, rv, ps)
    else:
        mod.add_function(name, rv, ps)


add_function('IncRef', None, [('{host}', 'handle')])
add_function('DecRef', None, [('{host}', 'handle')])
"#;

const BUILD_POSTAMBLE: &str = r#"
with open('{name}_shim.h', 'w') as header:
    header.write('/* C prototypes for the {path} shims. Generated by hostbind. */\n')
    header.write('#include <stdint.h>\n\n')
    header.write('\n'.join(_prototypes) + '\n')

mod.generate(open('{name}.c', 'w'))
"#;

pub struct BuildScriptRenderer {
    p: Printer,
}

impl BuildScriptRenderer {
    pub fn new() -> Self {
        Self {
            p: Printer::new("    "),
        }
    }
}

impl Default for BuildScriptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRenderer for BuildScriptRenderer {
    fn preamble(&mut self, ir: &BindingIr) {
        let text = fill_template(
            BUILD_PREAMBLE,
            &[
                ("path", ir.package.path.as_str()),
                ("name", ir.package.name.as_str()),
                ("regen", ir.regenerate_command.as_str()),
                ("host", ir.handle.host.as_str()),
            ],
        );
        self.p.raw(&text);
        self.p.blank();
    }

    fn section(&mut self, section: Section) {
        self.p.line(format!("# ---- {} ---", section.title()));
    }

    fn variable(&mut self, binding: &VarBinding) {
        self.p.line(render_call(&binding.getter).trim_end());
        if let Some(setter) = &binding.setter {
            self.p.line(render_call(setter).trim_end());
        }
    }

    fn class(&mut self, binding: &ClassBinding) {
        for call in binding.methods.iter().chain(&binding.properties) {
            self.p.line(render_call(call).trim_end());
        }
    }

    fn call(&mut self, binding: &CallBinding) {
        self.p.line(render_call(binding).trim_end());
    }

    fn postamble(&mut self, ir: &BindingIr) {
        let text = fill_template(
            BUILD_POSTAMBLE,
            &[
                ("path", ir.package.path.as_str()),
                ("name", ir.package.name.as_str()),
            ],
        );
        self.p.raw(&text);
    }

    fn finish(self) -> String {
        self.p.finish()
    }
}

/// Renders the declaration statement of a single call.
pub fn render_call(call: &CallBinding) -> String {
    let ret = match &call.result {
        Some(result) => format!("'{}'", result.host_tag),
        None => "None".to_string(),
    };
    let mut params = Vec::new();
    if let Some(receiver) = &call.receiver {
        params.push(format!("('{}', '_handle')", receiver.host_tag));
    }
    params.extend(
        call.params
            .iter()
            .map(|param| format!("('{}', '{}')", param.value.host_tag, param.name)),
    );
    let checked = if call.raises { ", checked=True" } else { "" };
    format!(
        "add_function('{}', {}, [{}]{})\n",
        call.export_name,
        ret,
        params.join(", "),
        checked
    )
}
