//! BTD6 Mod Installer CLI

use anyhow::{bail, Context, Result};
use btd6_installer_lib::{
    discover_candidates, system_volumes, Config, DownloadManager, InstallOrchestrator,
    InstallOutcome, InstallSession, InstallationTarget, RegistryProbe, RuntimeInstaller,
    RuntimeProbe, SystemLauncher,
};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "btd6-installer")]
#[command(about = "Install MelonLoader and the BTD6 Mod Helper into Bloons TD 6")]
#[command(version)]
#[command(long_about = r#"BTD6 Mod Installer

Finds Bloons TD 6 on local drives (Steam and Epic Games libraries), installs
MelonLoader and the BTD6 Mod Helper, and adds the Epic Games compatibility
plugin when needed. The .NET 6 runtime is checked first and installed if
missing.

Running without a command is the same as `btd6-installer install`.

EXAMPLES:
    btd6-installer search                       # List found installations
    btd6-installer install                      # Install into the first one found
    btd6-installer install --index 1            # Install into the second one
    btd6-installer install "D:\Games\BloonsTD6" # Install into a given folder
    btd6-installer -q install                   # Don't ask any questions
    btd6-installer status "D:\Games\BloonsTD6"  # Are mods installed?
    btd6-installer runtime --install            # Install .NET 6 if missing"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file (default: <config dir>/btd6-installer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't ask any questions, just install automatically
    #[arg(short = 'q', long, global = true)]
    unattended: bool,

    /// Don't draw download progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Search local drives for Bloons TD 6 installations
    Search {
        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether mods are installed in a game folder
    Status {
        /// Game folder or path to BloonsTD6.exe
        game_path: PathBuf,
    },

    /// Install MelonLoader and the BTD6 Mod Helper
    Install(InstallArgs),

    /// Check for the .NET 6 runtime
    Runtime {
        /// Install the runtime if it is missing
        #[arg(long)]
        install: bool,
    },
}

#[derive(Args, Default)]
struct InstallArgs {
    /// Game folder or path to BloonsTD6.exe (searched for when omitted)
    game_path: Option<PathBuf>,

    /// Which search result to install into
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Don't check for the .NET 6 runtime first
    #[arg(long)]
    skip_runtime_check: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "btd6_installer={0},btd6_installer_lib={0}",
            log_level
        ))
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if cli.no_progress {
        config.progress = false;
    }

    match cli.command.unwrap_or(Command::Install(InstallArgs::default())) {
        Command::Search { json } => search(&config, json),
        Command::Status { game_path } => status(&config, game_path),
        Command::Install(args) => install(&config, args, cli.unattended),
        Command::Runtime { install } => runtime(&config, install, cli.unattended),
    }
}

fn search(config: &Config, json: bool) -> Result<()> {
    let mut session = InstallSession::new();
    session.load_candidates(discover_candidates(system_volumes(), &config.layout));

    if json {
        println!("{}", serde_json::to_string_pretty(session.candidates())?);
        return Ok(());
    }

    if session.candidates().is_empty() {
        println!("No Bloons TD 6 installations found.");
        println!("Pass the game folder to `btd6-installer install` instead.");
        return Ok(());
    }

    for (i, candidate) in session.candidates().iter().enumerate() {
        println!("[{}] {}", i, candidate.executable.display());
    }
    Ok(())
}

fn status(config: &Config, game_path: PathBuf) -> Result<()> {
    let target = InstallationTarget::from_user_path(&game_path)?;
    let downloader = DownloadManager::new(&config.network, config.progress)?;
    let orchestrator =
        InstallOrchestrator::new(&downloader, config.sources.clone(), config.layout.clone());

    if orchestrator.detect_existing_install(&target)? {
        println!("Mods are installed in {}", target.dir().display());
    } else {
        println!("Mods are not installed in {}", target.dir().display());
    }
    Ok(())
}

fn install(config: &Config, args: InstallArgs, unattended: bool) -> Result<()> {
    let downloader = DownloadManager::new(&config.network, config.progress)?;

    if !args.skip_runtime_check {
        // Runtime check failures are logged; the install continues
        if let Err(e) = ensure_runtime(config, &downloader, unattended) {
            warn!("Error checking .NET version: {:#}", e);
        }
    }

    let mut session = InstallSession::new();
    match args.game_path {
        Some(path) => session.add_manual(&path, &config.layout)?,
        None => {
            info!("Searching for Bloons TD 6 installations...");
            session.load_candidates(discover_candidates(system_volumes(), &config.layout));
            if session.candidates().is_empty() {
                bail!(
                    "No Bloons TD 6 installations found. Please pass the game path manually."
                );
            }
            session
                .select(args.index)
                .with_context(|| format!("No search result with index {}", args.index))?;
        }
    }

    let target = session.target()?;
    if !unattended && !confirm(&format!("Install mods into {}?", target.dir().display()))? {
        println!("Cancelled.");
        return Ok(());
    }

    let orchestrator =
        InstallOrchestrator::new(&downloader, config.sources.clone(), config.layout.clone());
    match session.install(&orchestrator)? {
        InstallOutcome::AlreadyInstalled(dir) => {
            println!("Mods already installed in {}", dir.display());
            println!("If they are not working, verify the game files and try again.");
        }
        InstallOutcome::Installed(report) => {
            println!("Mods installed successfully!");
            println!("  MelonLoader: {} files", report.extracted_files);
            println!("  Mod Helper:  {}", report.mod_helper.display());
            if let Some(compat) = report.epic_compat {
                println!("  Epic compat: {}", compat.display());
            }
        }
    }
    Ok(())
}

fn runtime(config: &Config, install: bool, unattended: bool) -> Result<()> {
    let probe = RegistryProbe::new(&config.runtime.registry_key);
    if probe.is_installed()? {
        println!(".NET 6 runtime is installed");
        return Ok(());
    }

    if !install {
        println!(".NET 6 runtime is not installed");
        println!("Run `btd6-installer runtime --install` to install it.");
        return Ok(());
    }

    let downloader = DownloadManager::new(&config.network, config.progress)?;
    ensure_runtime(config, &downloader, unattended)
}

/// Install the .NET 6 runtime unless the registry says it is present
fn ensure_runtime(config: &Config, downloader: &DownloadManager, unattended: bool) -> Result<()> {
    let probe = RegistryProbe::new(&config.runtime.registry_key);
    if probe.is_installed()? {
        info!(".NET 6 runtime found");
        return Ok(());
    }

    println!("The .NET 6 runtime is required by MelonLoader and is not installed.");
    if !unattended {
        println!("The runtime installer will open; finish it and close it to continue.");
        if !confirm("Download and launch the .NET 6 installer?")? {
            warn!("Skipping .NET 6 runtime installation");
            return Ok(());
        }
    }

    let installer = RuntimeInstaller::new(
        downloader,
        SystemLauncher,
        &config.runtime,
        config.download_dir.clone(),
    );
    installer
        .install()
        .context("Failed to install the .NET 6 runtime")?;
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [Y/n] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer.starts_with('y'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_defaults_to_install() {
        let cli = Cli::try_parse_from(["btd6-installer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.unattended);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn install_takes_path_and_index() {
        let cli = Cli::try_parse_from([
            "btd6-installer",
            "install",
            "--index",
            "1",
            "--skip-runtime-check",
            "D:/Games/BloonsTD6",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Install(args)) => {
                assert_eq!(args.index, 1);
                assert!(args.skip_runtime_check);
                assert_eq!(args.game_path, Some(PathBuf::from("D:/Games/BloonsTD6")));
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["btd6-installer", "search", "--json", "-q", "-vv"]).unwrap();

        assert!(matches!(cli.command, Some(Command::Search { json: true })));
        assert!(cli.unattended);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn status_requires_a_path() {
        assert!(Cli::try_parse_from(["btd6-installer", "status"]).is_err());
        let cli =
            Cli::try_parse_from(["btd6-installer", "--no-progress", "status", "game"]).unwrap();
        assert!(cli.no_progress);
        assert!(matches!(cli.command, Some(Command::Status { .. })));
    }

    #[test]
    fn install_into_missing_folder_fails_before_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("BloonsTD6");
        let mut config = Config::default();
        config.progress = false;
        let args = InstallArgs {
            game_path: Some(missing.clone()),
            skip_runtime_check: true,
            ..InstallArgs::default()
        };

        let err = install(&config, args, true).unwrap_err();

        assert!(err.to_string().contains("Invalid game path"));
        assert!(!missing.exists());
        assert!(!dir.path().join("MelonLoader").exists());
        assert!(!dir.path().join("Mods").exists());
    }
}
