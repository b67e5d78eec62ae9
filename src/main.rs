//! Command-line interface for the `tinv` binary.
//!
//! The CLI discovers targets below an inventory directory and prints them, or
//! their rendered parameters, as JSON.

use std::{io, path::PathBuf, process};

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use target_inventory::{BackendKind, Error, Inventory, InventoryConfig, load_config};
use tracing_subscriber::EnvFilter;

/// Command line interface for inspecting a target inventory.
#[derive(Debug, Parser,)]
#[command(name = "tinv", version, about = "Discover and render inventory targets")]
struct Cli
{
    /// Inventory root holding `targets/` and `classes/`.
    #[arg(long = "inventory-path", value_name = "PATH", env = "TINV_INVENTORY_PATH")]
    inventory_path: Option<PathBuf,>,

    /// YAML file with inventory settings; flags override its values.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Build target names from the full relative path.
    #[arg(long = "compose-target-name", action = ArgAction::SetTrue)]
    compose_target_name: bool,

    /// Backend used to render targets.
    #[arg(long = "backend", value_enum, value_name = "BACKEND")]
    backend: Option<BackendKind,>,

    /// Log debug diagnostics to stderr.
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// List discovered targets and their definition files.
    Targets(OutputArgs,),
    /// Render one target and print it.
    Show(ShowArgs,),
    /// Render targets and print their parameters keyed by name.
    Params(ParamsArgs,),
    /// Migrate the inventory to the current on-disk format.
    Migrate,
}

#[derive(Debug, Args, Default,)]
struct OutputArgs
{
    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

#[derive(Debug, Args,)]
struct ShowArgs
{
    /// Name of the target to render.
    #[arg(value_name = "NAME")]
    name: String,

    /// Skip classes that cannot be found instead of failing.
    #[arg(long = "ignore-missing", action = ArgAction::SetTrue)]
    ignore_missing: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args,)]
struct ParamsArgs
{
    /// Targets to render; all targets when omitted.
    #[arg(value_name = "NAME")]
    names: Vec<String,>,

    /// Skip unknown targets and classes instead of failing.
    #[arg(long = "ignore-missing", action = ArgAction::SetTrue)]
    ignore_missing: bool,

    #[command(flatten)]
    output: OutputArgs,
}

/// Entry in the `targets` listing.
#[derive(Debug, Serialize, PartialEq, Eq,)]
struct TargetListing
{
    name: String,
    path: String,
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    let cli = Cli::parse();
    init_tracing(cli.verbose,);

    if let Err(error,) = run(cli,) {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing(verbose: bool,)
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose { EnvFilter::new("target_inventory=debug,info",) } else { EnvFilter::new("warn",) }
    },);
    let _ = tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).try_init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, discovery, lookup and render errors.
fn run(cli: Cli,) -> Result<(), Error,>
{
    let config = resolve_config(&cli,)?;
    let inventory = Inventory::new(&config,);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Command::Targets(args,) => {
            inventory.initialise()?;
            write_json(&mut handle, &list_targets(&inventory,), args.pretty,)
        }
        Command::Show(args,) => {
            let target = inventory.get_target(&args.name, args.ignore_missing,)?;
            write_json(&mut handle, &target, args.output.pretty,)
        }
        Command::Params(args,) => {
            let parameters = inventory.get_parameters_many(&args.names, args.ignore_missing,)?;
            write_json(&mut handle, &parameters, args.output.pretty,)
        }
        Command::Migrate => inventory.migrate(),
    }
}

/// Merges the optional configuration file with command line overrides.
fn resolve_config(cli: &Cli,) -> Result<InventoryConfig, Error,>
{
    let mut config = match cli.config.as_deref() {
        Some(path,) => load_config(path,)?,
        None => InventoryConfig::default(),
    };

    if let Some(path,) = cli.inventory_path.as_ref() {
        config.inventory_path = path.clone();
    }
    if cli.compose_target_name {
        config.compose_target_name = true;
    }
    if let Some(backend,) = cli.backend {
        config.backend = backend;
    }

    Ok(config,)
}

fn list_targets(inventory: &Inventory,) -> Vec<TargetListing,>
{
    inventory
        .targets()
        .into_values()
        .map(|target| TargetListing {
            path: inventory.targets_path().join(&target.path,).display().to_string(),
            name: target.name,
        },)
        .collect()
}

fn write_json<W, T,>(writer: &mut W, value: &T, pretty: bool,) -> Result<(), Error,>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    if pretty {
        serde_json::to_writer_pretty(writer, value,)?;
    } else {
        serde_json::to_writer(writer, value,)?;
    }

    Ok((),)
}
