use anyhow::{Result, anyhow};
use clap::Parser;
use electron_installer::install::{InstallOptions, install, list_versions, show};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// electron-installer - Electron binaries for Composer projects
///
/// Downloads the Electron build for this machine, places it in the project's
/// bin directory and records where it went in
/// vendor/uuf6429/electron-installer/electron-binary.json.
///
/// ELECTRON_VERSION, ELECTRON_PLATFORM, ELECTRON_ARCHITECTURE, ELECTRON_CDNURL
/// and ELECTRON_PLACEMENT override what would otherwise be detected.
/// If GITHUB_TOKEN is set, it is used to query the release listing.
#[derive(Parser, Debug)]
#[command(author, version = env!("ELECTRON_INSTALLER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing composer.json
    #[arg(
        long = "project-dir",
        short = 'd',
        env = "ELECTRON_INSTALLER_PROJECT_DIR",
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    project_dir: PathBuf,

    /// Variable supplied by the host invocation, consulted after the environment
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_var,
        global = true
    )]
    vars: Vec<(String, String)>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download and install Electron into the project's bin directory
    Install(InstallArgs),

    /// List known Electron versions, newest first
    Versions(VersionsArgs),

    /// Print the binding file of the installed Electron
    Show,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    /// Reinstall even if the installed version is current
    #[arg(long)]
    force: bool,

    /// Use the built-in version list instead of querying releases
    #[arg(long)]
    offline: bool,
}

#[derive(clap::Args, Debug)]
struct VersionsArgs {
    /// Use the built-in version list instead of querying releases
    #[arg(long)]
    offline: bool,
}

fn parse_var(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(anyhow!("empty variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = electron_installer::runtime::RealRuntime;
    let server_vars: BTreeMap<String, String> = cli.vars.into_iter().collect();

    match cli.command {
        Commands::Install(args) => {
            let options = InstallOptions {
                force: args.force,
                offline: args.offline,
            };
            install(runtime, &cli.project_dir, server_vars, options).await?;
        }
        Commands::Versions(args) => {
            list_versions(runtime, &cli.project_dir, server_vars, args.offline).await?
        }
        Commands::Show => show(runtime, &cli.project_dir, server_vars)?,
    }
    Ok(())
}
