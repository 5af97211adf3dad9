use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use dirsum::cli::{Cli, Commands};
use dirsum::config::Config;
use dirsum::error::{EXIT_CHANGED, EXIT_OTHER, EXIT_SCAN};
use dirsum::output::{self, Verbosity};
use dirsum::scanner::FileTypeFilter;
use dirsum::{DirsumContext, commands};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            output::error(&format!("{e:#}"));
            process::exit(exit_code(&e));
        }
    }
}

/// Exit code for a failed run, derived from the core error family if any.
fn exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<dirsum::Error>()
        .map_or(EXIT_OTHER, dirsum::Error::exit_code)
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
            return Ok(0);
        }
        command => command,
    };

    output::set_verbosity(if cli.verbose {
        Verbosity::Verbose
    } else if cli.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    });

    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let log_file = cli.log_file.as_deref().or(config.core.log_file.as_deref());
    init_logging(cli.verbose, log_file)?;

    let file_types = cli
        .types
        .as_deref()
        .map(|types| FileTypeFilter::from_extensions(types.split(',')));
    let ctx = DirsumContext::from_config(&cli.base, cli.manifest.as_deref(), file_types, &config)?;

    let started = Instant::now();
    let code = match command {
        Commands::Update { scope, force } => run_update(&ctx, scope.as_deref(), force)?,
        Commands::Check {
            scope,
            force,
            keep_going,
        } => run_check(&ctx, scope.as_deref(), force, keep_going)?,
        Commands::Completion { .. } => 0,
    };

    let elapsed = Duration::from_millis(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
    output::verbose(&format!("Finished in {}", humantime::format_duration(elapsed)));
    Ok(code)
}

fn run_update(ctx: &DirsumContext, scope: Option<&Path>, force: bool) -> Result<i32> {
    let result = commands::update::execute(ctx, scope, force)?;
    if result.written {
        output::success(&format!(
            "{}: {} ({} entries scanned)",
            result.reason,
            ctx.manifest_path.display(),
            result.scanned
        ));
    } else {
        output::info(&format!("{} ({} entries scanned)", result.reason, result.scanned));
    }
    Ok(0)
}

fn run_check(
    ctx: &DirsumContext,
    scope: Option<&Path>,
    force: bool,
    keep_going: bool,
) -> Result<i32> {
    let result = commands::check::execute(ctx, scope, force, keep_going)?;

    output::changes(&result.changes);
    output::scan_errors(&result.scan_errors);

    if result.changed {
        output::info(&output::describe_summary(result.summary));
    } else {
        output::success("No changes");
    }

    Ok(if !result.scan_errors.is_empty() {
        EXIT_SCAN
    } else if result.changed {
        EXIT_CHANGED
    } else {
        0
    })
}

/// Installs the tracing subscriber; `RUST_LOG` overrides the level chosen here.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "dirsum=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
