/* Analyze command - report classified symbols and skipped declarations */

use super::common::{load_config, load_description, print_diagnostics};
use anyhow::Context;
use clap::ValueEnum;
use hostbind_gen::codegen::shared::builder::IrBuilder;
use hostbind_gen::codegen::shared::ir::BindingIr;
use hostbind_gen::model::Package;
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum IrOutputFormat {
    Json,
    Yaml,
}

/* Execute the analyze command */
pub fn run(
    file: PathBuf,
    config_path: Option<PathBuf>,
    print_ir: bool,
    ir_format: IrOutputFormat,
) -> anyhow::Result<()> {
    println!("hostbind - Package Analysis");
    println!("===========================\n");

    let config = load_config(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;
    let description = load_description(&file)?;
    let package = Package::analyze(&description, &config);

    println!("[~] Package {} (host module {})", package.path, package.name);
    println!("[~] {} symbol(s) classified:", package.symbols.len());
    for symbol in package.symbols.iter() {
        let crossing = if symbol.requires_handle {
            "handle"
        } else if symbol.host_tag.is_some() {
            "value"
        } else {
            "none"
        };
        println!(
            "    - {:<32} {:<10} {:<7} {}",
            symbol.canonical,
            symbol.kind.tag(),
            crossing,
            symbol.native_name
        );
    }
    println!(
        "[~] {} struct(s), {} interface(s), {} function(s), {} constant(s), {} variable(s)",
        package.structs.len(),
        package.interfaces.len(),
        package.funcs.len(),
        package.consts.len(),
        package.vars.len()
    );

    let regenerate = config.regenerate_command(&file.display().to_string());
    let ir = IrBuilder::new(&package, &config, regenerate)
        .build()
        .context("failed to build binding IR")?;
    println!("[~] {} shim entry point(s)", ir.calls().len());
    print_diagnostics(&ir.diagnostics);

    if print_ir {
        print_binding_ir(&ir, ir_format)?;
    }
    Ok(())
}

fn print_binding_ir(ir: &BindingIr, format: IrOutputFormat) -> anyhow::Result<()> {
    match format {
        IrOutputFormat::Json => {
            println!("\n[~] Binding IR (JSON, schema v{})", ir.version);
            println!("==============================");
            println!("{}", serde_json::to_string_pretty(ir)?);
        }
        IrOutputFormat::Yaml => {
            println!("\n[~] Binding IR (YAML, schema v{})", ir.version);
            println!("==============================");
            println!("{}", serde_yml::to_string(ir)?);
        }
    }
    Ok(())
}
