//! Command-line driver for qualifying every communicating module.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use channel::{DevProvider, ProcHub};
use domtests::standard_pool;
use orchestrator::{Orchestrator, RunOptions};
use testkit::PoolConfig;

/// Drive and qualify the attached optical modules.
#[derive(Parser, Debug)]
#[command(author, version, about = "Run the module qualification pool", long_about = None)]
struct Cli {
    /// Run only the named tests (repeatable). Naming an only-if-selected
    /// test enables it.
    #[arg(short = 't', long = "test", value_name = "NAME")]
    tests: Vec<String>,

    /// Per-test repeat count, as NAME=N (repeatable).
    #[arg(long = "repeat", value_name = "NAME=N", value_parser = parse_repeat)]
    repeats: Vec<(String, u32)>,

    /// Per-test run length override in seconds, as NAME=SECS (repeatable).
    #[arg(long = "duration", value_name = "NAME=SECS", value_parser = parse_duration)]
    durations: Vec<(String, u64)>,

    /// Enable high-voltage tests.
    #[arg(long = "hv")]
    hv: bool,

    /// Enable flasher-board tests.
    #[arg(long = "flasher")]
    flasher: bool,

    /// Enable pairwise power-cycle tests.
    #[arg(long = "power-cycle")]
    power_cycle: bool,

    /// Number of full pool cycles per channel.
    #[arg(long = "cycles", default_value_t = 1)]
    cycles: u32,

    /// Stop each channel at its first failure.
    #[arg(short = 's', long = "stop-fail")]
    stop_fail: bool,

    /// Suppress per-test result lines; failures and the summary remain.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Print the configured pool and exit.
    #[arg(long = "list")]
    list: bool,
}

fn parse_repeat(raw: &str) -> Result<(String, u32), String> {
    let (name, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=N, got \"{raw}\""))?;
    let count: u32 = count
        .parse()
        .map_err(|e| format!("bad repeat count in \"{raw}\": {e}"))?;
    Ok((name.to_string(), count))
}

fn parse_duration(raw: &str) -> Result<(String, u64), String> {
    let (name, secs) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=SECS, got \"{raw}\""))?;
    let secs: u64 = secs
        .parse()
        .map_err(|e| format!("bad duration in \"{raw}\": {e}"))?;
    Ok((name.to_string(), secs))
}

fn pool_config(cli: &Cli) -> PoolConfig {
    let mut config = PoolConfig::new();
    for name in &cli.tests {
        config.select(name.clone());
    }
    for (name, count) in &cli.repeats {
        config.set_repeat(name.clone(), *count);
    }
    for (name, secs) in &cli.durations {
        config.set_duration(name.clone(), Duration::from_secs(*secs));
    }
    config.allow_hv = cli.hv;
    config.allow_flasher = cli.flasher;
    config.allow_power_cycle = cli.power_cycle;
    config
}

fn list_pool(config: &PoolConfig) {
    println!("NAME                    STATES   FLAGS");
    for test in standard_pool(config) {
        let info = test.info();
        let mut flags = Vec::new();
        if info.needs_hv {
            flags.push("hv");
        }
        if info.needs_flasher {
            flags.push("flasher");
        }
        if info.needs_power_cycle {
            flags.push("power-cycle");
        }
        if info.selected_only {
            flags.push("selected-only");
        }
        if info.run_length.is_some() {
            flags.push("timed");
        }
        println!(
            "{:<23} {}->{}   {}",
            info.name,
            info.start,
            info.end,
            flags.join(",")
        );
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = pool_config(&cli);

    if cli.list {
        list_pool(&config);
        return Ok(true);
    }
    if cli.cycles == 0 {
        bail!("--cycles must be at least 1");
    }

    let hub = Arc::new(ProcHub::default());
    let provider = Arc::new(DevProvider::new());
    let options = RunOptions {
        cycles: cli.cycles,
        stop_on_fail: cli.stop_fail,
        quiet: cli.quiet,
        domapp_settle: None,
    };

    let orchestrator = Orchestrator::new(hub, provider, config, options);
    let summary = orchestrator
        .run()
        .context("qualification run could not start")?;
    println!("{summary}");
    Ok(summary.all_passed())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
