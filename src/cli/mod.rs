use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::Cli;
use crate::config::{expand, DEFAULT_CONFIG_PATH};
use crate::engine::Backedup;
use crate::fs::OsFs;
use crate::util::paths::{normalize, resolve_home};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const FLAG_NAMES: &[&str] = &["config", "backup", "restore", "uninstall", "verbose", "help", "version"];

pub mod args;

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    if cli.help {
        print_help();
        return Ok(());
    }
    if cli.version {
        println!("backedup {}", VERSION);
        return Ok(());
    }
    let Some(operation) = cli.operation() else {
        print_help();
        std::process::exit(1);
    };

    let home = resolve_home()?;
    let raw = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let conf_path = normalize(&PathBuf::from(
        expand(raw, &home).with_context(|| format!("config path {}", raw))?,
    ));
    tracing::debug!(config = %conf_path.display(), home = %home.display(), %operation, "starting");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut backedup = Backedup::new(OsFs, &mut input, io::stderr(), &conf_path, &home)?;
    backedup.run(operation)?;

    println!("done");
    Ok(())
}

fn parse_cli() -> Cli {
    let raw: Vec<String> = env::args().collect();
    match Cli::try_parse_from(preprocess_args(raw)) {
        Ok(cli) => cli,
        Err(err) => {
            if err.kind() == ErrorKind::UnknownArgument {
                if let Some(arg) = err.context().find_map(|c| {
                    if let clap::error::ContextKind::InvalidArg = c.0 {
                        Some(c.1.to_string())
                    } else {
                        None
                    }
                }) {
                    println!("flag provided but not defined: {}", arg);
                    print_help();
                    std::process::exit(2);
                }
            }
            println!("{}", err);
            std::process::exit(2);
        }
    }
}

/// Accept single-dash long flags (`-backup`, `-config=x`) next to the
/// `--long` forms clap understands.
fn preprocess_args(raw: Vec<String>) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = raw.into_iter();
    if let Some(bin) = iter.next() {
        out.push(bin);
    }
    let mut expect_value = false;
    for arg in iter {
        if expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        let single = arg
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .map(|rest| rest.split_once('=').map_or(rest, |(name, _)| name));
        let arg = match single {
            Some(name) if FLAG_NAMES.contains(&name) => format!("-{}", arg),
            _ => arg,
        };
        if arg == "--config" {
            expect_value = true;
        }
        out.push(arg);
    }
    out
}

fn print_help() {
    println!("Usage:");
    println!("  backedup -backup|-restore|-uninstall [options]");
    println!();
    println!("Options:");
    println!("  -backup            Move configured files to the backup path and symlink them");
    println!("  -restore           Create symlinks for previously backed up files");
    println!("  -uninstall         Replace symlinks with copies of the backed up files");
    println!("  -config <path>     Config file path (default {})", DEFAULT_CONFIG_PATH);
    println!("  -verbose, -v       Verbose logging");
    println!("  -version           Print version");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
