/* Gen command - write the shim, build script, wrapper and Makefile */

use super::common::{load_config, load_description, print_diagnostics};
use anyhow::Context;
use hostbind_gen::codegen;
use hostbind_gen::model::Package;
use std::path::PathBuf;
use tracing::info;

/* CLI overrides applied on top of the config file */
#[derive(Debug, Default)]
pub struct Overrides {
    pub vm: Option<String>,
    pub lib_ext: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
}

/* Execute the gen command */
pub fn run(
    file: PathBuf,
    output_dir: PathBuf,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(vm) = overrides.vm {
        config.vm = vm;
    }
    if let Some(lib_ext) = overrides.lib_ext {
        config.lib_ext = lib_ext;
    }
    if overrides.name.is_some() {
        config.package_name = overrides.name;
    }
    if overrides.path.is_some() {
        config.package_path = overrides.path;
    }
    config.validate().context("invalid configuration")?;

    let description = load_description(&file)?;
    let package = Package::analyze(&description, &config);
    info!(package = %package.path, "analyzed package description");

    let bindings = codegen::generate(&package, &config, &file.display().to_string())
        .with_context(|| format!("failed to generate bindings for {}", package.path))?;

    let written = bindings
        .write_to_dir(&output_dir)
        .with_context(|| format!("failed to write output to {}", output_dir.display()))?;

    println!("[~] Generated bindings for {}", package.path);
    for path in &written {
        println!("    - {}", path.display());
    }
    print_diagnostics(bindings.diagnostics());
    Ok(())
}
