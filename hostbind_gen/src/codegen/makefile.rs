//! Build-script stream: a Makefile that compiles the shim into a shared
//! library, runs the declaration script and links the host extension.

use crate::codegen::shared::ir::BindingIr;
use crate::codegen::shared::printer::Printer;
use crate::codegen::shared::stream::{StreamRenderer, fill_template};

const MAKEFILE_TEMPLATE: &str = "# Makefile for python interface for package {path}.
# File is generated by hostbind. Do not edit.
# {regen}

PYTHON = {vm}
PYTHON_CFG = $(PYTHON)-config
RUSTC = rustc
CC = gcc
LIBEXT = {libext}

# rlib of the native package; override on the command line if it lives elsewhere
NATIVE_RLIB ?= lib{native}.rlib
NATIVE_DEPS ?= .

CFLAGS = `$(PYTHON_CFG) --cflags` -fPIC -Ofast
LDFLAGS = `$(PYTHON_CFG) --ldflags`

.PHONY: all gen build clean

all: build

gen:
\t{regen}

build:
\t# build the native shim library exporting the C entry points
\t$(RUSTC) --edition 2021 --crate-type cdylib --crate-name {name}_shim -O -L $(NATIVE_DEPS) --extern {native}=$(NATIVE_RLIB) -o lib{name}_shim$(LIBEXT) {name}_shim.rs
\t# generate the CPython extension source and the shim header
\t$(PYTHON) build.py
\t# compile and link the extension against the shim library
\t$(CC) {name}.c -shared -fPIC $(CFLAGS) -o _{name}$(LIBEXT) -L. -l{name}_shim -Wl,-rpath,'$$ORIGIN' $(LDFLAGS)

clean:
\trm -f lib{name}_shim$(LIBEXT) _{name}$(LIBEXT) {name}.c {name}_shim.h
";

pub struct MakefileRenderer {
    p: Printer,
    vm: String,
    lib_ext: String,
}

impl MakefileRenderer {
    pub fn new(vm: &str, lib_ext: &str) -> Self {
        Self {
            p: Printer::new("\t"),
            vm: vm.to_string(),
            lib_ext: lib_ext.to_string(),
        }
    }
}

impl StreamRenderer for MakefileRenderer {
    fn preamble(&mut self, ir: &BindingIr) {
        let text = fill_template(
            MAKEFILE_TEMPLATE,
            &[
                ("path", ir.package.path.as_str()),
                ("name", ir.package.name.as_str()),
                ("regen", ir.regenerate_command.as_str()),
                ("vm", self.vm.as_str()),
                ("libext", self.lib_ext.as_str()),
                ("native", ir.package.native_crate()),
            ],
        );
        self.p.raw(&text);
    }

    fn finish(self) -> String {
        self.p.finish()
    }
}
