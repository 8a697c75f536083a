//! docnav - replay documentation-page navigation widgets headlessly.
//!
//! # Usage
//!
//! ```bash
//! docnav page.json
//! docnav page.json --script steps.json
//! docnav page.json --script steps.json --json
//! docnav page.json --script steps.json --watch
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use docnav::app::{App, Snapshot};
use docnav::components::Timings;
use docnav::config::{
    clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags, ConfigFlags,
};
use docnav::dom::PageSpec;
use docnav::script::{Script, StepReport};
use docnav::watcher::FileWatcher;

/// Replay scroll highlighting and panel toggles on a page description
#[derive(Parser, Debug)]
#[command(name = "docnav", version, about, long_about = None)]
struct Cli {
    /// Page description (JSON)
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Replay script (JSON array of steps)
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Re-run whenever the page or script changes
    #[arg(short, long)]
    watch: bool,

    /// Log widget activity to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Offset added to the scroll position before locating the section
    #[arg(long, value_name = "PX")]
    epsilon: Option<f64>,

    /// Delay before an in-page link closes its panel
    #[arg(long, value_name = "MS")]
    dismiss_delay: Option<u64>,

    /// Lifetime of the to-has-*/from-has-* transition classes
    #[arg(long, value_name = "MS")]
    transition: Option<u64>,

    /// Pointer travel that turns a tap into a drag
    #[arg(long, value_name = "PX")]
    move_threshold: Option<f64>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            watch: self.watch,
            json: self.json,
            verbose: self.verbose,
            epsilon: self.epsilon,
            dismiss_delay_ms: self.dismiss_delay,
            transition_ms: self.transition,
            move_threshold: self.move_threshold,
        }
    }
}

/// Machine-readable result of one replay.
#[derive(Serialize)]
struct Replay {
    initial: Snapshot,
    steps: Vec<StepReport>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn read_page(path: &Path) -> Result<PageSpec> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read page {}", path.display()))?;
    PageSpec::parse(&json).with_context(|| format!("Failed to parse page {}", path.display()))
}

fn read_script(path: &Path) -> Result<Script> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    Script::parse(&json).with_context(|| format!("Failed to parse script {}", path.display()))
}

fn replay(cli: &Cli, timings: Timings, json: bool) -> Result<()> {
    let spec = read_page(&cli.page)?;
    let script = cli
        .script
        .as_deref()
        .map(read_script)
        .transpose()?
        .unwrap_or_default();

    let mut app = App::from_spec(&spec)
        .with_context(|| format!("Failed to build page {}", cli.page.display()))?
        .with_timings(timings);
    app.start();
    let initial = app.snapshot();
    let steps = script.run(&mut app).context("Replay failed")?;
    info!(url = %spec.url, steps = steps.len(), "replay finished");

    if json {
        let out = serde_json::to_string_pretty(&Replay { initial, steps })?;
        println!("{out}");
    } else {
        println!("[start]\n    {initial}");
        for report in &steps {
            println!("{report}");
        }
    }
    Ok(())
}

fn watch(cli: &Cli, timings: Timings, json: bool) -> Result<()> {
    let mut paths = vec![cli.page.clone()];
    paths.extend(cli.script.clone());
    let mut watcher = FileWatcher::new(&paths, Duration::from_millis(200))
        .context("Failed to watch input files")?;
    eprintln!("watching for changes (Ctrl-C to quit)");
    loop {
        std::thread::sleep(Duration::from_millis(250));
        if watcher.take_change_ready() {
            debug!("inputs changed, replaying");
            println!();
            // A broken edit should not end the session.
            if let Err(err) = replay(cli, timings, json) {
                eprintln!("error: {err:#}");
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.verbose);
    debug!(?effective, "effective flags");

    if !cli.page.exists() {
        anyhow::bail!("File not found: {}", cli.page.display());
    }

    let timings = effective.to_timings();
    let result = replay(&cli, timings, effective.json);
    if effective.watch {
        if let Err(err) = result {
            eprintln!("error: {err:#}");
        }
        return watch(&cli, timings, effective.json);
    }
    result
}
