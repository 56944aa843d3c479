use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use curldiff::archive::{export_csv, report_file_name, FsSnapshotStore, SnapshotStore};
use curldiff::compare::{compare, CompareMode};
use curldiff::config::{load_config, Settings, SettingsBuilder, TOKEN_VAR};
use curldiff::diff::diff;
use curldiff::executor::{RequestExecutor, ReqwestTransport, ResponseBody};
use curldiff::printer;
use curldiff::workbench::{run_batch, BatchOptions, Workbench};

#[derive(Parser, Debug)]
#[command(
    name = "curldiff",
    version,
    about = "Run CURL commands and diff their responses",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing curldiff.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Session file holding the active tests
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Bearer token that replaces any Authorization header
    #[arg(long, global = true)]
    token: Option<String>,

    /// Env file relative to the config directory
    #[arg(short, long, global = true)]
    env: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a CURL command as a pending test
    Add {
        /// Comparison key; tests sharing a key are diffed against each other
        #[arg(short, long)]
        key: String,
        /// Group label
        #[arg(short, long)]
        group: Option<String>,
        /// Read the command from a file
        #[arg(short, long, conflicts_with = "command")]
        file: Option<PathBuf>,
        /// CURL command (read from stdin when omitted)
        #[arg(value_name = "COMMAND")]
        command: Option<String>,
    },
    /// List tests
    List,
    /// Show one test with its response and diff
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Execute tests concurrently (every pending test when no id is given)
    Run {
        #[arg(value_name = "ID")]
        ids: Vec<String>,
    },
    /// Queue a copy of a test and execute it
    Rerun {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Delete tests
    Remove {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<String>,
    },
    /// Delete every test
    Clear,
    /// Compare responses across each key group
    Compare {
        /// Only compare this key
        #[arg(short, long)]
        key: Option<String>,
        /// Diff each response against its predecessor instead of the first one
        #[arg(long)]
        adjacent: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Diff two response bodies stored in files
    Diff {
        #[arg(value_name = "PREVIOUS")]
        previous: PathBuf,
        #[arg(value_name = "CURRENT")]
        current: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show test counts by status
    Stats,
    /// Manage saved snapshots of the test set
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },
    /// Write a CSV report of every test
    Export {
        /// Output file (defaults to api-test-report-<timestamp>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ArchiveAction {
    /// Save the current tests
    Save,
    /// List saved snapshots, newest first
    List,
    /// Replace the current tests with a snapshot
    Load {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Delete a snapshot
    Delete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Delete every snapshot
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let config_dir = cfg.as_ref().map(|c| c.dir.clone()).unwrap_or_else(|| {
        if config_target.is_dir() {
            config_target.clone()
        } else {
            config_target
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| config_target.clone())
        }
    });

    let settings = SettingsBuilder::new(base_dir.clone(), cfg)
        .env_file(cli.env.as_ref().map(|p| resolve_relative(&config_dir, p)))
        .session_file(cli.session.as_ref().map(|p| resolve_relative(&base_dir, p)))
        .token(cli.token.clone())
        .process_token(std::env::var(TOKEN_VAR).ok())
        .build()
        .context("resolving settings")?;

    let mut workbench = Workbench::load(&settings.session_file)?;

    let changed = match cli.command {
        Commands::Add {
            key,
            group,
            file,
            command,
        } => {
            let command = read_command(command, file.map(|p| resolve_relative(&base_dir, &p)))?;
            let group = group.unwrap_or_else(|| settings.default_group.clone());
            let record = workbench.submit(&command, &key, Some(group.as_str()))?;
            println!("Added {} ({} {})", record.id, record.request.method, record.request.url);
            true
        }
        Commands::List => {
            printer::print_records(workbench.records());
            false
        }
        Commands::Show { id } => {
            let Some(record) = workbench.get(&id) else {
                bail!("unknown test id: {id}");
            };
            printer::print_record(record);
            false
        }
        Commands::Run { ids } => {
            let ids = if ids.is_empty() {
                workbench.pending_ids()
            } else {
                ids
            };
            run_tests(&mut workbench, &settings, &ids).await?
        }
        Commands::Rerun { id } => {
            let new_id = workbench.resubmit(&id)?.id.clone();
            run_tests(&mut workbench, &settings, &[new_id]).await?
        }
        Commands::Remove { ids } => {
            for id in &ids {
                workbench.remove(id)?;
            }
            println!("Removed {} test(s)", ids.len());
            true
        }
        Commands::Clear => {
            let removed = workbench.clear();
            println!("Removed {removed} test(s)");
            true
        }
        Commands::Compare {
            key,
            adjacent,
            json,
        } => {
            let mode = if adjacent {
                CompareMode::Adjacent
            } else {
                settings.compare_mode
            };
            let records: Vec<_> = workbench
                .records()
                .iter()
                .filter(|record| key.as_deref().map_or(true, |key| record.key == key))
                .cloned()
                .collect();
            let report = compare(&records, mode);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                printer::print_comparison(&report);
            }
            false
        }
        Commands::Diff {
            previous,
            current,
            json,
        } => {
            let previous = read_body(&resolve_relative(&base_dir, &previous))?;
            let current = read_body(&resolve_relative(&base_dir, &current))?;
            let report = diff(&previous, &current);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                printer::print_diff_report(&report);
            }
            false
        }
        Commands::Stats => {
            printer::print_stats(&workbench.stats());
            false
        }
        Commands::Archive { action } => handle_archive(&mut workbench, &settings, action)?,
        Commands::Export { out } => {
            if workbench.records().is_empty() {
                bail!("no test records to export");
            }
            let out = out
                .map(|p| resolve_relative(&base_dir, &p))
                .unwrap_or_else(|| base_dir.join(report_file_name(Utc::now())));
            fs::write(&out, export_csv(workbench.records()))
                .with_context(|| format!("writing report to {}", out.display()))?;
            println!("Report written to {}", out.display());
            false
        }
    };

    if changed {
        workbench.save(&settings.session_file)?;
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "curldiff=warn",
        1 => "curldiff=info",
        _ => "curldiff=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_tests(workbench: &mut Workbench, settings: &Settings, ids: &[String]) -> Result<bool> {
    if ids.is_empty() {
        println!("No pending tests");
        return Ok(false);
    }

    let transport = ReqwestTransport::new(settings.timeout).context("building HTTP client")?;
    let executor = RequestExecutor::new(Arc::new(transport));

    let bar = ProgressBar::new(ids.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let outcome = run_batch(
        workbench,
        &executor,
        ids,
        BatchOptions {
            override_token: settings.override_token.as_deref(),
            concurrency: settings.concurrency,
        },
        |completed, _total| bar.set_position(completed as u64),
    )
    .await?;
    bar.finish_and_clear();

    let ran: Vec<_> = workbench
        .records()
        .iter()
        .filter(|record| ids.contains(&record.id))
        .cloned()
        .collect();
    printer::print_records(&ran);
    printer::print_batch_outcome(&outcome);
    Ok(true)
}

fn handle_archive(
    workbench: &mut Workbench,
    settings: &Settings,
    action: ArchiveAction,
) -> Result<bool> {
    let store = FsSnapshotStore::new(settings.archive_dir.clone());
    match action {
        ArchiveAction::Save => {
            let key = store.save(workbench.records())?;
            println!("Saved snapshot {key}");
            Ok(false)
        }
        ArchiveAction::List => {
            printer::print_snapshots(&store.list()?);
            Ok(false)
        }
        ArchiveAction::Load { key } => {
            let snapshot = store.load(&key)?;
            let count = snapshot.data.len();
            workbench.replace_all(snapshot.data);
            println!("Loaded {count} test(s) from {key}");
            Ok(true)
        }
        ArchiveAction::Delete { key } => {
            if !store.delete(&key)? {
                bail!("no snapshot named {key}");
            }
            println!("Deleted snapshot {key}");
            Ok(false)
        }
        ArchiveAction::Clear => {
            let removed = store.clear()?;
            println!("Deleted {removed} snapshot(s)");
            Ok(false)
        }
    }
}

fn read_command(inline: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (inline, file) {
        (Some(command), _) => Ok(command),
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("reading command file {}", path.display())),
        (None, None) => std::io::read_to_string(std::io::stdin()).context("reading command from stdin"),
    }
}

fn read_body(path: &Path) -> Result<ResponseBody> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading response body {}", path.display()))?;
    Ok(ResponseBody::from_text(text))
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
