use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::{Command, Stdio};

const PACKAGE: &str = "rewards-extension";
const WASM_TARGET: &str = "wasm32-unknown-unknown";
const PKG_DIR: &str = "extension/pkg";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Rewards extension task runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the WASM bundles (payments page + background page)
    Build {
        /// Optimized build
        #[arg(short, long)]
        release: bool,
    },

    /// Run all Rust tests
    Test,

    /// Run clippy on the host and WASM targets
    Clippy,

    /// Remove build output
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { release } => build(release),
        Commands::Test => test(),
        Commands::Clippy => clippy(),
        Commands::Clean => clean(),
    }
}

fn build(release: bool) -> Result<()> {
    let profile = if release { "release" } else { "debug" };

    println!("🔨 Building payments page bundle ({})...", profile);
    let mut args = vec!["build", "extension", "--target", "web", "--out-dir", "pkg/page"];
    if !release {
        args.push("--dev");
    }
    run_cmd("wasm-pack", &args)?;

    println!("🔨 Building background bundle ({})...", profile);
    let mut args = vec![
        "build",
        "-p",
        PACKAGE,
        "--bin",
        "background",
        "--target",
        WASM_TARGET,
    ];
    if release {
        args.push("--release");
    }
    run_cmd("cargo", &args)?;

    let wasm = format!("target/{}/{}/background.wasm", WASM_TARGET, profile);
    if !Path::new(&wasm).exists() {
        anyhow::bail!("Expected build output missing: {}", wasm);
    }

    run_cmd(
        "wasm-bindgen",
        &["--target", "no-modules", "--out-dir", PKG_DIR, &wasm],
    )?;

    println!("✅ Bundles written to {}", PKG_DIR);
    Ok(())
}

fn test() -> Result<()> {
    println!("🧪 Running all tests...");
    run_cmd("cargo", &["test", "--workspace"])?;
    Ok(())
}

fn clippy() -> Result<()> {
    println!("🔍 Running clippy on workspace (warnings as errors)...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;

    println!("🔍 Running clippy for {}...", WASM_TARGET);
    run_cmd(
        "cargo",
        &[
            "clippy",
            "-p",
            PACKAGE,
            "--target",
            WASM_TARGET,
            "--",
            "-D",
            "warnings",
        ],
    )?;
    Ok(())
}

fn clean() -> Result<()> {
    println!("🧹 Removing bundles...");
    if Path::new(PKG_DIR).exists() {
        std::fs::remove_dir_all(PKG_DIR)
            .with_context(|| format!("Failed to remove {}", PKG_DIR))?;
    }

    println!("🗑️  Running cargo clean...");
    run_cmd("cargo", &["clean"])?;
    Ok(())
}

fn run_cmd(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", program, args.join(" "));
    }

    Ok(())
}
