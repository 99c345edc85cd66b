use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "z2folio", version, about = "z2folio gateway CLI - offline config and query diagnostics")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a gateway configuration file for consistency and correctness.
    Check {
        /// Path to the configuration file.
        #[arg(long, short, default_value = "z2folio.json")]
        config: PathBuf,
    },

    /// Translate one RPN query against a configuration file and print the resulting CQL.
    Explain {
        /// Path to the configuration file.
        #[arg(long, short, default_value = "z2folio.json")]
        config: PathBuf,

        /// RPN tree as a literal JSON string, or `@path` to read it from a file.
        rpn: String,

        /// Attribute-set OID to use for attributes that omit their own `set` field.
        #[arg(long)]
        default_attribute_set: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check { config } => commands::check::run(&config)?,
        Command::Explain {
            config,
            rpn,
            default_attribute_set,
        } => {
            commands::explain::run(&config, &rpn, default_attribute_set.as_deref())?;
        }
    }

    Ok(())
}
