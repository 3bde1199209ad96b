//! Build script for autotyper
//!
//! Renders section 1 man pages for the binary and each of its subcommands
//! with clap_mangen. Pages are written on release builds, or on any build
//! when `AUTOTYPER_GEN_MANPAGES` is set. `AUTOTYPER_MAN_DIR` overrides the
//! output directory (default: `$OUT_DIR/man`).

use clap::{Command, CommandFactory};
use clap_mangen::Man;
use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=AUTOTYPER_GEN_MANPAGES");
    println!("cargo:rerun-if-env-changed=AUTOTYPER_MAN_DIR");

    let release = env::var("PROFILE").is_ok_and(|p| p == "release");
    if !release && env::var_os("AUTOTYPER_GEN_MANPAGES").is_none() {
        return Ok(());
    }

    let man_dir = match env::var_os("AUTOTYPER_MAN_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env::var_os("OUT_DIR").unwrap_or_else(|| "target".into())).join("man"),
    };
    fs::create_dir_all(&man_dir)?;

    let cli = Cli::command();
    let mut pages = vec![render_page(cli.clone(), cli.get_name(), &man_dir)?];
    for sub in cli.get_subcommands().filter(|s| s.get_name() != "help") {
        // `autotyper-type(1)` rather than `type(1)` in the page header
        let title = format!("{}-{}", cli.get_name(), sub.get_name());
        pages.push(render_page(sub.clone(), &title, &man_dir)?);
    }

    println!(
        "cargo:warning=Wrote {} man pages to {}",
        pages.len(),
        man_dir.display()
    );
    Ok(())
}

/// Render one page as `<title>.1` and return its path
fn render_page(cmd: Command, title: &str, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(format!("{}.1", title));
    let mut out = File::create(&path)?;
    Man::new(cmd).title(title.to_uppercase()).render(&mut out)?;
    Ok(path)
}
