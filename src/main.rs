//! Packline - a content-addressed static asset pipeline.

#![allow(dead_code)]

mod build;
mod cli;
mod compress;
mod config;
mod entry;
mod fingerprint;
mod logger;
mod manifest;
mod transform;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{BuildMode, BuildProfile, EnvSnapshot, PipelineConfig};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::serve::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.build_args().verbose);

    let config = PipelineConfig::load(&cli.config)?;
    let env = EnvSnapshot::capture();

    // The subcommand picks the default profile; PACKLINE_ENV can force
    // either one (e.g. a production build served locally for inspection).
    let default_mode = match cli.command {
        Commands::Build { .. } => BuildMode::Production,
        Commands::Serve { .. } => BuildMode::Development,
    };
    let mode = env.mode.unwrap_or(default_mode);

    let mut profile = BuildProfile::resolve(mode, &config, &env);
    cli::apply_overrides(&mut profile, &cli);

    match &cli.command {
        Commands::Build { .. } => cli::build::run(&config, &profile),
        Commands::Serve { .. } => cli::serve::run(&config, &profile),
    }
}
