use clap::{Parser, Subcommand};
use cmds::analyze::IrOutputFormat;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cmds;

#[derive(Parser)]
#[command(name = "hostbind")]
#[command(about = "Python binding generator for native Rust packages", long_about = None)]
struct Cli {
    /* Enable debug logging */
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate the shim, build script, wrapper module and Makefile */
    Gen {
        /* Package description (YAML) */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: PathBuf,

        /* Output directory for generated files */
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /* Generator config (YAML) */
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Host interpreter used by the Makefile */
        #[arg(long = "vm", value_name = "PYTHON")]
        vm: Option<String>,

        /* Shared-library extension for built artifacts */
        #[arg(long = "lib-ext", value_name = "EXT")]
        lib_ext: Option<String>,

        /* Host module name (overrides the description) */
        #[arg(long = "name", value_name = "NAME")]
        name: Option<String>,

        /* Native package path (overrides the description) */
        #[arg(long = "path", value_name = "PATH")]
        path: Option<String>,
    },

    /* Analyze a package description and report what would be bound */
    Analyze {
        /* Package description (YAML) */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: PathBuf,

        /* Generator config (YAML) */
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Print the binding IR after analysis */
        #[arg(long = "print-ir")]
        print_ir: bool,

        /* Format to use when printing the binding IR */
        #[arg(long = "ir-format", value_enum, default_value = "json")]
        ir_format: IrOutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Gen {
            file,
            output_dir,
            config,
            vm,
            lib_ext,
            name,
            path,
        } => {
            let overrides = cmds::generate::Overrides {
                vm,
                lib_ext,
                name,
                path,
            };
            cmds::generate::run(file, output_dir, config, overrides)?;
        }

        Commands::Analyze {
            file,
            config,
            print_ir,
            ir_format,
        } => {
            cmds::analyze::run(file, config, print_ir, ir_format)?;
        }
    }

    Ok(())
}
