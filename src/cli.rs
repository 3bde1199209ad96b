// Command-line interface definitions for autotyper
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "autotyper")]
#[command(author, version, about = "Types text into the focused window like a human")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "
Autotyper types text into whatever window has keyboard focus, using simulated
keystrokes. It can paste everything at once, paste line by line, type one
character at a time at a chosen speed, or type like a person: pausing to think
after each line and making (and fixing) the occasional typo.

SETUP:
  1. Install wtype (Wayland) or ydotool (X11/Wayland) for typing support
  2. Install wl-clipboard for the paste-based modes
  3. Try it safely: autotyper --dry-run \"hello world\"

USAGE:
  autotyper \"some text\"          Type the text after a 5 second countdown
  autotyper --file notes.txt     Type the contents of a file
  autotyper --from-clipboard     Type whatever is on the clipboard

  Switch to the target window during the countdown.
  Press Escape (default) to pause or resume, press it twice quickly to stop.
  Alt+Shift+= and Alt+Shift+- change the speed while typing.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emission mode
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeArg>,

    /// Typing speed in characters per minute
    #[arg(long, value_name = "CPM", global = true)]
    pub speed: Option<u32>,

    /// Random variation of each keystroke delay (0.0 - 1.0)
    #[arg(long, value_name = "FRACTION", global = true)]
    pub jitter: Option<f64>,

    /// Chance of a corrected typo per character in super-human mode (0.0 - 1.0)
    #[arg(long, value_name = "PROBABILITY", global = true)]
    pub typo_chance: Option<f64>,

    /// Seconds to switch windows before typing starts
    #[arg(long, value_name = "SECS", global = true)]
    pub countdown: Option<u32>,

    /// Keystroke backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendArg>,

    /// Print the text to the terminal instead of typing it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Override pause/stop hotkey (e.g., ESCAPE, PAUSE, F13)
    #[arg(long, value_name = "KEY", global = true)]
    pub hotkey: Option<String>,

    /// Disable the global hotkey (stop with Ctrl+C)
    #[arg(long, global = true)]
    pub no_hotkey: bool,

    /// Text source when no command is given
    #[command(flatten)]
    pub input: TypeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Type text into the focused window (default if no command specified)
    Type(TypeArgs),

    /// Show current configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long, conflicts_with = "save")]
        init: bool,

        /// Save the effective configuration, overrides included, to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Where the text comes from; stdin when nothing is given
#[derive(clap::Args, Default)]
pub struct TypeArgs {
    /// Text to type
    #[arg(conflicts_with_all = ["file", "from_clipboard"])]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, value_name = "FILE", conflicts_with = "from_clipboard")]
    pub file: Option<std::path::PathBuf>,

    /// Type the current clipboard contents
    #[arg(long)]
    pub from_clipboard: bool,
}

/// Emission mode names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Paste the whole text at once
    Turbo,
    /// Paste line by line
    Block,
    /// Type character by character
    Natural,
    /// Type with thinking pauses and corrected typos
    #[value(alias = "superhuman", alias = "human")]
    SuperHuman,
}

/// Keystroke backend names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// wtype on Wayland, then ydotool
    Auto,
    Wtype,
    Ydotool,
    /// Print instead of typing
    DryRun,
}
