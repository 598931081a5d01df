// WireGuard Mesh Configuration Generator

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use wg_mesh::{
    example::scaffold_example,
    loader::LoadOptions,
    orchestrator::{clean_peers_dir, discover_network_files, render_networks},
    settings::{self, load_settings_or_default},
};

#[derive(Parser)]
#[command(name = "wg-mesh")]
#[command(about = "Generate WireGuard configurations for every peer of a mesh network", long_about = None)]
struct Args {
    /// Path to the optional settings file
    #[arg(short, long, default_value = "wg-mesh.toml")]
    settings: PathBuf,

    /// Directory containing network description files (*.conf)
    #[arg(long)]
    networks_dir: Option<PathBuf>,

    /// Directory receiving one sub-directory per peer
    #[arg(long)]
    peers_dir: Option<PathBuf>,

    /// Log level [off|error|warn|info|debug|trace]
    #[arg(long = "log")]
    log_level: Option<String>,

    /// Debug mode, alias of --log debug
    #[arg(long)]
    debug: bool,

    /// Create the networks directory with an example network description
    #[arg(long)]
    example: bool,

    /// Remove everything in the peers directory before generating
    #[arg(long)]
    clean: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

/// Ask a yes/no question on stdin, defaulting to no
fn confirm(question: &str) -> Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer from stdin")?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

fn is_dir_empty(dir: &Path) -> Result<bool> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?;
    Ok(entries.next().is_none())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load settings, command line flags take precedence
    let settings = load_settings_or_default(&args.settings)?;
    let log_level = if args.debug {
        "debug".to_string()
    } else {
        args.log_level
            .clone()
            .unwrap_or_else(|| settings.general.log_level.clone())
    };
    settings::validate_log_level(&log_level)?;
    let networks_dir = args
        .networks_dir
        .clone()
        .unwrap_or_else(|| settings.general.networks_dir.clone());
    let peers_dir = args
        .peers_dir
        .clone()
        .unwrap_or_else(|| settings.general.peers_dir.clone());
    let load_options = LoadOptions::from(settings.loader);

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&log_level))
        .init();

    if args.example {
        if !args.yes
            && !is_dir_empty(Path::new("."))?
            && !confirm(
                "The current directory is not empty, create the example here anyway?\n\
                 You may want to cd into a new directory first",
            )?
        {
            return Ok(());
        }
        log::info!("==== Generating directory structure with examples ====");
        scaffold_example(&networks_dir).context("Failed to create example network")?;
    }

    if args.clean {
        log::warn!("Cleaning peers directory {}", peers_dir.display());
        clean_peers_dir(&peers_dir)
            .with_context(|| format!("Failed to clean peers directory {:?}", peers_dir))?;
    }

    let files = discover_network_files(&networks_dir)
        .with_context(|| format!("Failed to read networks directory {:?}", networks_dir))?;
    if files.is_empty() {
        log::warn!(
            "No network description (*.conf) found in {}, try --example",
            networks_dir.display()
        );
        return Ok(());
    }

    let generated_at = chrono::Local::now();
    let results = render_networks(&files, &peers_dir, &load_options, &generated_at);

    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok(written) => log::info!(
                "Wrote {} peer configuration(s) from {}",
                written.len(),
                path.display()
            ),
            Err(e) => {
                log::error!("Failed to process network description {:?}: {}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} network(s) failed", failed, files.len());
    }

    Ok(())
}
