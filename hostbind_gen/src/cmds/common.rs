/* Common utilities shared between the analyze and gen commands */

use anyhow::Context;
use hostbind_gen::config::GenConfig;
use hostbind_gen::errors::Diagnostic;
use hostbind_gen::types::PackageFile;
use std::path::Path;

/* Load and parse a package description */
pub fn load_description(path: &Path) -> anyhow::Result<PackageFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read package description {}", path.display()))?;
    let file: PackageFile = serde_yml::from_str(&text)
        .with_context(|| format!("failed to parse package description {}", path.display()))?;
    Ok(file)
}

/* Load the config file if one was given, otherwise start from defaults */
pub fn load_config(path: Option<&Path>) -> anyhow::Result<GenConfig> {
    match path {
        Some(path) => GenConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(GenConfig::default()),
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("[!] {} symbol(s) skipped:", diagnostics.len());
    for diagnostic in diagnostics {
        println!("    - {}", diagnostic);
    }
}
