//! Autotyper - types text into the focused window like a human
//!
//! Run with `autotyper "text"`, `autotyper --file notes.txt`, or pipe text on
//! stdin. Use `autotyper config` to show the effective configuration.

use anyhow::Context;
use autotyper::cli::{BackendArg, Cli, Commands, ModeArg, TypeArgs};
use autotyper::config::{self, Config, OutputBackend};
use autotyper::job::{SpeedTier, TypingMode};
use autotyper::output::clipboard::WlClipboard;
use autotyper::output::ClipboardService;
use autotyper::Session;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Read;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);

    init_logging(&cli, &config);

    // Run the appropriate command
    match &cli.command {
        Some(Commands::Config { init, save }) => {
            if *init {
                init_config(cli.config.as_deref())?;
            }
            if *save {
                let path = config_path(cli.config.as_deref())?;
                config::save_config(&config, &path)?;
                println!("Saved configuration to {:?}\n", path);
            }
            show_config(&config);
        }
        Some(Commands::Type(input)) => run_type(&cli, config, input).await?,
        None => run_type(&cli, config, &cli.input).await?,
    }

    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(mode) = cli.mode {
        config.typing.mode = match mode {
            ModeArg::Turbo => TypingMode::Turbo,
            ModeArg::Block => TypingMode::Block,
            ModeArg::Natural => TypingMode::Natural,
            ModeArg::SuperHuman => TypingMode::SuperHuman,
        };
    }
    if let Some(speed) = cli.speed {
        config.typing.speed_cpm = speed;
    }
    if let Some(jitter) = cli.jitter {
        config.typing.jitter = jitter;
    }
    if let Some(chance) = cli.typo_chance {
        config.typing.typo_probability = chance;
    }
    if let Some(countdown) = cli.countdown {
        config.timing.countdown_secs = countdown;
    }
    if let Some(backend) = cli.backend {
        config.output.backend = match backend {
            BackendArg::Auto => OutputBackend::Auto,
            BackendArg::Wtype => OutputBackend::Wtype,
            BackendArg::Ydotool => OutputBackend::Ydotool,
            BackendArg::DryRun => OutputBackend::DryRun,
        };
    }
    if cli.dry_run {
        config.output.backend = OutputBackend::DryRun;
    }
    if let Some(ref hotkey) = cli.hotkey {
        config.hotkey.key = hotkey.clone();
    }
    if cli.no_hotkey {
        config.hotkey.enabled = false;
    }
}

/// Console logging on stderr, plus the session log file when configured
fn init_logging(cli: &Cli, config: &Config) {
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("autotyper={},warn", log_level)))
    };

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = config.resolve_log_file().and_then(|path| {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Warning: cannot create log directory {:?}: {}", parent, e);
                return None;
            }
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter()),
            ),
            Err(e) => {
                eprintln!("Warning: cannot open log file {:?}: {}", path, e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(console.with_filter(filter()))
        .with(file_layer)
        .init();
}

/// Type text from the argument, a file, the clipboard or stdin
async fn run_type(cli: &Cli, config: Config, input: &TypeArgs) -> anyhow::Result<()> {
    let text = read_input(input).await?;
    let dry_run = config.output.backend == OutputBackend::DryRun;

    if !cli.quiet {
        eprintln!(
            "Typing {} characters in {} mode. Switch to the target window now.",
            text.chars().count(),
            config.typing.mode
        );
    }

    let session = Session::new(config, cli.quiet);
    let success = session.run(text).await?;

    if dry_run && !cli.quiet {
        eprintln!();
    }
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn read_input(input: &TypeArgs) -> anyhow::Result<String> {
    if let Some(ref text) = input.text {
        return Ok(text.clone());
    }
    if let Some(ref path) = input.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path));
    }
    if input.from_clipboard {
        return WlClipboard::new()
            .paste()
            .await
            .context("Failed to read the clipboard");
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text)
}

/// Explicit `--config` path, else the per-user default
fn config_path(path: Option<&std::path::Path>) -> anyhow::Result<std::path::PathBuf> {
    path.map(std::path::PathBuf::from)
        .or_else(Config::default_path)
        .context("Cannot determine the config file location")
}

/// Write the commented default config file unless one already exists
fn init_config(path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = config_path(path)?;
    if path.exists() {
        println!("Config file already exists: {:?}\n", path);
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, config::DEFAULT_CONFIG)?;
    println!("Wrote default config to {:?}\n", path);
    Ok(())
}

/// Show current configuration
fn show_config(config: &Config) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[typing]");
    println!("  mode = {}", config.typing.mode);
    println!(
        "  speed_cpm = {} ({})",
        config.typing.speed_cpm,
        SpeedTier::from_cpm(config.typing.speed_cpm)
    );
    println!("  jitter = {}", config.typing.jitter);
    println!("  typo_probability = {}", config.typing.typo_probability);
    if let Some(seed) = config.typing.seed {
        println!("  seed = {}", seed);
    }
    if config.typing.adjacency.is_some() {
        println!("  adjacency = custom ({} keys)", config.typing.adjacency_table().len());
    }

    println!("\n[timing]");
    println!("  countdown_secs = {}", config.timing.countdown_secs);
    println!("  poll_interval_ms = {}", config.timing.poll_interval_ms);
    println!("  clipboard_settle_ms = {}", config.timing.clipboard_settle_ms);
    println!("  line_delay_ms = {}", config.timing.line_delay_ms);
    println!(
        "  think_ms = {}-{}",
        config.timing.think_min_ms, config.timing.think_max_ms
    );
    println!(
        "  reaction_ms = {}-{}",
        config.timing.reaction_min_ms, config.timing.reaction_max_ms
    );
    println!(
        "  correction_ms = {}-{}",
        config.timing.correction_min_ms, config.timing.correction_max_ms
    );

    println!("\n[hotkey]");
    println!("  enabled = {}", config.hotkey.enabled);
    println!("  key = {:?}", config.hotkey.key);
    println!("  double_press_ms = {}", config.hotkey.double_press_ms);
    println!("  speed_keys = {}", config.hotkey.speed_keys);
    println!("  speed_step = {}", config.hotkey.speed_step);

    println!("\n[output]");
    println!("  backend = {}", config.output.backend);

    println!("\n---");
    match Config::default_path() {
        Some(path) => println!("Config file: {:?}", path),
        None => println!("Config file: (no home directory)"),
    }
    match config.resolve_log_file() {
        Some(path) => println!("Log file: {:?}", path),
        None => println!("Log file: disabled"),
    }
}
