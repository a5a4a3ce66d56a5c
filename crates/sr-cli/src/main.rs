//! CLI binary for sr: generate RPC glue for Go services and fetch remote
//! declarations.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use sr_cli::client::{FileHelperSource, HelperSource, HttpHelperSource};
use sr_cli::{split_object_reference, split_reference};
use sr_core::generated::CommitReport;
use sr_core::meta::{HelperQuery, KIND_SIGNAL, KIND_SLOT, ObjectMeta};
use sr_emit::pipeline::{self, GenKind};
use sr_emit::{GenContext, function_listing, materialize_call, materialize_listen, object_listing};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sr", about = "RPC code generator for Go services")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from the project's declarations
    Gen {
        /// Generator: call, slot, signal, listen, all
        #[arg(default_value = "all")]
        kind: GenKind,
    },

    /// Fetch declarations of a remote service into internal/srpc/service
    Get {
        /// What to fetch
        kind: FetchKind,

        /// target[@object]; listen requires the object
        reference: String,

        /// Read helper metadata from a saved JSON response instead of the service
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// List the objects a remote service publishes
    Ols {
        target: String,

        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// List the functions of one remote object
    Fls {
        /// target@object
        reference: String,

        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Print the version
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum FetchKind {
    /// Slot objects, called through generated clients
    Call,
    /// A signal object, received through generated listeners
    Listen,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Version = cli.command {
        println!("sr {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Gen { kind } => cmd_gen(&project_root, kind),
        Commands::Get {
            kind,
            reference,
            from,
        } => cmd_get(&project_root, kind, &reference, from),
        Commands::Ols { target, from } => cmd_ols(&project_root, &target, from),
        Commands::Fls { reference, from } => cmd_fls(&project_root, &reference, from),
        Commands::Version => Ok(()),
    }
}

fn load_context(project_root: &Path) -> Result<GenContext> {
    GenContext::load(project_root)
        .with_context(|| format!("failed to open Go project at {}", project_root.display()))
}

fn helper_source(ctx: &GenContext, from: Option<PathBuf>) -> Box<dyn HelperSource> {
    match from {
        Some(path) => Box::new(FileHelperSource::new(path)),
        None => Box::new(HttpHelperSource::new(
            ctx.config.remote.address.clone(),
            Duration::from_secs(ctx.config.remote.timeout_secs),
        )),
    }
}

fn report(ctx: &GenContext, report: &CommitReport) {
    for path in &report.written {
        eprintln!("  wrote   {}", ctx.project.display_path(path).display());
    }
    for path in &report.removed {
        eprintln!("  removed {}", ctx.project.display_path(path).display());
    }
    if report.written.is_empty() && report.removed.is_empty() {
        eprintln!("Generated code is up to date.");
    } else {
        eprintln!(
            "{} written, {} removed, {} unchanged",
            report.written.len(),
            report.removed.len(),
            report.unchanged.len()
        );
    }
}

fn cmd_gen(project_root: &Path, kind: GenKind) -> Result<()> {
    let ctx = load_context(project_root)?;
    let result = pipeline::run(&ctx, kind).with_context(|| format!("gen {kind} failed"))?;
    report(&ctx, &result);
    Ok(())
}

fn cmd_get(
    project_root: &Path,
    kind: FetchKind,
    reference: &str,
    from: Option<PathBuf>,
) -> Result<()> {
    let ctx = load_context(project_root)?;
    let source = helper_source(&ctx, from);

    let (target, staging, next) = match kind {
        FetchKind::Call => {
            let (target, object) = split_reference(reference)?;
            let query = HelperQuery::new(object.unwrap_or_default(), KIND_SLOT);
            let objects = source
                .list(target, &query)
                .with_context(|| format!("failed to fetch slot helpers from {target}"))?;
            if objects.is_empty() {
                bail!("{target} publishes no matching slot objects");
            }
            (target, materialize_call(&ctx, target, &objects)?, GenKind::Call)
        }
        FetchKind::Listen => {
            let (target, object) = split_object_reference(reference)?;
            let query = HelperQuery::new(object, KIND_SIGNAL);
            let objects = source
                .list(target, &query)
                .with_context(|| format!("failed to fetch signal helpers from {target}"))?;
            let object = single(objects, target, object)?;
            (target, materialize_listen(&ctx, target, &object)?, GenKind::Listen)
        }
    };

    let result = pipeline::commit(&ctx, staging)?;
    report(&ctx, &result);
    eprintln!("Run `sr gen {next}` to regenerate code for {target}.");
    Ok(())
}

fn single(mut objects: Vec<ObjectMeta>, target: &str, object: &str) -> Result<ObjectMeta> {
    match objects.len() {
        0 => bail!("object {object} not found in {target}"),
        1 => Ok(objects.remove(0)),
        n => bail!("{n} objects named {object} in {target}"),
    }
}

fn cmd_ols(project_root: &Path, target: &str, from: Option<PathBuf>) -> Result<()> {
    let ctx = load_context(project_root)?;
    let objects = helper_source(&ctx, from)
        .list(target, &HelperQuery::default())
        .with_context(|| format!("failed to list objects of {target}"))?;
    for line in object_listing(&objects) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_fls(project_root: &Path, reference: &str, from: Option<PathBuf>) -> Result<()> {
    let (target, object) = split_object_reference(reference)?;
    let ctx = load_context(project_root)?;
    let objects = helper_source(&ctx, from)
        .list(target, &HelperQuery::new(object, ""))
        .with_context(|| format!("failed to list functions of {reference}"))?;
    let Some(first) = objects.first() else {
        bail!("object {object} not found in {target}");
    };
    for line in function_listing(first)? {
        println!("{line}");
    }
    Ok(())
}
