pub mod makefile;
pub mod pybuild;
pub mod pywrap;
pub mod shared;
pub mod shim;

use crate::config::GenConfig;
use crate::errors::{Diagnostic, GenError};
use crate::model::Package;
use shared::builder::IrBuilder;
use shared::ir::BindingIr;
use shared::stream::render;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The four generated files for one package, plus the IR they came from.
#[derive(Debug, Clone)]
pub struct GeneratedBindings {
    pub package_name: String,
    pub shim: String,
    pub build_script: String,
    pub wrapper: String,
    pub makefile: String,
    pub ir: BindingIr,
}

impl GeneratedBindings {
    pub fn shim_file_name(&self) -> String {
        format!("{}_shim.rs", self.package_name)
    }

    pub fn wrapper_file_name(&self) -> String {
        format!("{}.py", self.package_name)
    }

    /// File name and contents of every stream, in the order they are written.
    pub fn files(&self) -> Vec<(String, &str)> {
        vec![
            (self.shim_file_name(), self.shim.as_str()),
            ("build.py".to_string(), self.build_script.as_str()),
            (self.wrapper_file_name(), self.wrapper.as_str()),
            ("Makefile".to_string(), self.makefile.as_str()),
        ]
    }

    /// Writes all four files into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (name, contents) in self.files() {
            let path = dir.join(name);
            fs::write(&path, contents)?;
            debug!(path = %path.display(), bytes = contents.len(), "wrote file");
            written.push(path);
        }
        Ok(written)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.ir.diagnostics
    }
}

/// Generates every stream for an analyzed package.
///
/// `description_source` is how the description file is named in the
/// regenerate command recorded in each preamble.
pub fn generate(
    package: &Package,
    config: &GenConfig,
    description_source: &str,
) -> Result<GeneratedBindings, GenError> {
    config.validate()?;
    let regenerate = config.regenerate_command(description_source);
    let ir = IrBuilder::new(package, config, regenerate).build()?;
    let extension = ir.package.extension_module();

    let shim = render(&ir, shim::ShimRenderer::new());
    let build_script = render(&ir, pybuild::BuildScriptRenderer::new());
    let wrapper = render(&ir, pywrap::WrapperRenderer::new(&extension));
    let makefile = render(&ir, makefile::MakefileRenderer::new(&config.vm, &config.lib_ext));

    info!(
        package = %ir.package.name,
        diagnostics = ir.diagnostics.len(),
        "generated bindings"
    );
    Ok(GeneratedBindings {
        package_name: ir.package.name.clone(),
        shim,
        build_script,
        wrapper,
        makefile,
        ir,
    })
}
