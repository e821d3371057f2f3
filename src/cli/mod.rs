//! Command-line interface module.

mod args;
pub mod build;
pub mod serve;

pub use args::{BuildArgs, Cli, Commands};

use crate::config::{BuildMode, BuildProfile};

/// Apply CLI overrides on top of a resolved profile.
///
/// Flags sit above both the config file and the environment snapshot;
/// an explicit `--minify false` beats what the profile forced.
pub fn apply_overrides(profile: &mut BuildProfile, cli: &Cli) {
    let args = cli.build_args();

    if let Some(output) = &args.output {
        profile.output = output.clone();
    }
    if let Some(minify) = args.minify {
        profile.minify = minify;
    }
    if let Some(compress) = args.compress {
        profile.compress = compress;
    }
    if args.clean {
        profile.clean = true;
    }

    if let Commands::Serve {
        host, port, watch, ..
    } = &cli.command
    {
        if let Some(host) = host {
            profile.host = host.clone();
        }
        if let Some(port) = port {
            profile.port = *port;
        }
        if let Some(watch) = watch {
            profile.watch = *watch;
        }
        // Development manifest URLs track the listener
        if profile.mode == BuildMode::Development && (host.is_some() || port.is_some()) {
            profile.public_base = format!("http://{}:{}", profile.host, profile.port);
        }
    }
}
