use anyhow::{Context, Result, bail};
use clap::Parser;
use lockdiff_core::report::{ReportOptions, TableOptions, render_report};
use lockdiff_core::{ChangeStatus, ParsedLock, count_statuses, diff_locks, parse_lock};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lockdiff")]
#[command(about = "Report dependency changes between two yarn lockfiles")]
struct Args {
  /// Lockfile before the change, e.g. from the base branch
  #[arg(value_name = "PREVIOUS")]
  previous: PathBuf,

  /// Lockfile after the change
  #[arg(value_name = "CURRENT")]
  current: PathBuf,

  /// Order the table by change status, then by package name
  #[arg(long, env = "LOCKDIFF_GROUP_BY_STATUS")]
  group_by_status: bool,

  /// Exit with an error when any package was downgraded
  #[arg(long, env = "LOCKDIFF_FAIL_ON_DOWNGRADE")]
  fail_on_downgrade: bool,

  /// Number of changes from which a summary is shown and the table collapsed
  #[arg(long, env = "LOCKDIFF_COLLAPSE_THRESHOLD", default_value_t = 25)]
  collapse_threshold: usize,

  /// Plain text statuses instead of badge images
  #[arg(long, env = "LOCKDIFF_PLAIN")]
  plain: bool,

  /// Print the changes as JSON instead of a markdown report
  #[arg(long)]
  json: bool,

  /// Report heading, defaults to the path of the current lockfile
  #[arg(long, env = "LOCKDIFF_TITLE")]
  title: Option<String>,

  /// Debug logging
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let args = Args::parse();

  // RUST_LOG wins over --verbose
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if args.verbose {
      EnvFilter::new("lockdiff=debug")
    } else {
      EnvFilter::new("lockdiff=info")
    }
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();

  if let Err(e) = run(&args) {
    eprintln!("error: {e:#}");
    std::process::exit(1);
  }
}

fn read_lock(path: &Path) -> Result<ParsedLock> {
  let contents = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read lockfile {}", path.display()))?;

  let lock = parse_lock(&contents);
  if lock.is_supported() {
    info!(
      path = %path.display(),
      format = ?lock.format,
      keys = lock.len(),
      "parsed lockfile"
    );
  } else {
    warn!(
      path = %path.display(),
      "unsupported yarn lockfile format, diffing it as empty"
    );
  }

  Ok(lock)
}

fn run(args: &Args) -> Result<()> {
  let previous = read_lock(&args.previous)?;
  let current = read_lock(&args.current)?;
  let changes = diff_locks(&previous, &current);

  if args.json {
    let json = serde_json::to_string_pretty(&changes).context("failed to serialize changes")?;
    println!("{json}");
  } else {
    let options = ReportOptions {
      title: args
        .title
        .clone()
        .unwrap_or_else(|| args.current.display().to_string()),
      table: TableOptions {
        group_by_status: args.group_by_status,
        plain_statuses: args.plain,
      },
      collapse_threshold: args.collapse_threshold,
    };

    match render_report(&changes, &options) {
      Some(report) => println!("{report}"),
      None => info!("no dependency changes"),
    }
  }

  let downgrades = count_statuses(&changes, ChangeStatus::Downgraded);
  if downgrades > 0 {
    warn!(downgrades, "dependency downgrade detected");
    if args.fail_on_downgrade {
      bail!("{downgrades} dependency downgrade(s) detected with --fail-on-downgrade set");
    }
  }

  Ok(())
}
