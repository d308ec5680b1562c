mod cli;

use fieldconv::config::{self, ConversionRequest};
use fieldconv::convert::FfmpegConverter;
use fieldconv::daemon::{self, DaemonExit};
use fieldconv::pool::BatchOutcome;
use fieldconv::shutdown;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Cli, Commands, ConvertArgs};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn convert(args: ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    args.apply(&mut config.convert);

    let request = ConversionRequest::from_config(&config.convert)?;
    let tools: &[&str] = if request.with_frame() {
        &["ffmpeg", "ffprobe"]
    } else {
        &["ffmpeg"]
    };
    for tool in tools {
        if let Err(e) = fieldconv_av::require_tool(tool) {
            tracing::warn!("{}, conversions will fail until it is installed", e);
        }
    }

    tracing::info!(
        "Converting {} files from {:?} to {:?}",
        request.extension(),
        request.input_dir(),
        request.output_dir()
    );
    if let Some(interval) = request.poll_interval() {
        tracing::info!("Polling every {:?}, press Ctrl+C to stop", interval);
    }

    let cancel = CancellationToken::new();
    shutdown::install(cancel.clone());

    let converter = Arc::new(FfmpegConverter::from_request(&request));
    match daemon::run(&request, converter, &cancel).await? {
        DaemonExit::Finished(BatchOutcome::Failed { job, error }) => {
            bail!("conversion of {} failed: {}", job, error)
        }
        DaemonExit::Finished(_) => Ok(()),
        DaemonExit::Interrupted => {
            tracing::info!("Stopped by user");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "fieldconv=debug,fieldconv_av=debug".to_string()
        } else {
            "fieldconv=info,fieldconv_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert(args, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("fieldconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in fieldconv_av::check_tools() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };
        print!("{} {}", status, tool.name);
        if let Some(version) = &tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }
        if let Some(path) = &tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to convert recordings.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let convert = &config.convert;
    let dir_or = |dir: &Option<std::path::PathBuf>, fallback: &str| {
        dir.as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| fallback.to_string())
    };
    println!("  Input dir: {}", dir_or(&convert.input_dir, "(current directory)"));
    println!("  Output dir: {}", dir_or(&convert.output_dir, "(input directory)"));
    println!("  Type: {}", config::normalize_extension(&convert.extension));
    println!("  Pool size: {}", convert.pool_size);
    println!("  Frame counter: {}", convert.with_frame);
    println!("  Delete originals: {}", convert.delete_originals);
    match convert.poll_interval_secs.filter(|s| *s > 0) {
        Some(secs) => println!("  Poll interval: {}s", secs),
        None => println!("  Poll interval: (single pass)"),
    }

    Ok(())
}
