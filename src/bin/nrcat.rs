use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use nr_catalog_manager::archive::HttpArchiveClient;
use nr_catalog_manager::config::{ConfigLoader, CrawlConfig};
use nr_catalog_manager::crawler::Catalog;
use nr_catalog_manager::domain::{PayloadKind, SimulationName};
use nr_catalog_manager::error::CatalogError;
use nr_catalog_manager::output::{ClearResult, FetchResult, JsonOutput, ListResult, SyncResult};
use nr_catalog_manager::store::Store;

#[derive(Parser)]
#[command(name = "nrcat")]
#[command(about = "Catalog manager for the RIT numerical-relativity waveform archive")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage the simulation catalog")]
    Catalog(CatalogArgs),
}

#[derive(Args)]
struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand)]
enum CatalogCommand {
    #[command(about = "Load or refresh the catalog snapshot")]
    Sync(SyncArgs),
    #[command(about = "List simulations in the local snapshot")]
    List,
    #[command(about = "Show the full record of one simulation")]
    Info(InfoArgs),
    #[command(about = "Download one simulation's payload file")]
    Fetch(FetchArgs),
    #[command(about = "Download payload files for the whole catalog")]
    FetchAll(FetchAllArgs),
    #[command(about = "Remove the local cache directory")]
    Clear,
}

#[derive(Args)]
struct SyncArgs {
    #[arg(long)]
    config: Option<String>,

    /// Override the crawl bound from the config file.
    #[arg(long)]
    limit: Option<usize>,

    /// Permit a full remote crawl when the cache is incomplete.
    #[arg(long)]
    download: bool,

    /// Skip the disk cache tier and probe the archive directly.
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct InfoArgs {
    simulation: String,
}

#[derive(Args)]
struct FetchArgs {
    simulation: String,

    #[arg(long, value_enum, default_value_t = PayloadKind::Waveform)]
    which: PayloadKind,
}

#[derive(Args)]
struct FetchAllArgs {
    #[arg(long, value_enum, default_value_t = PayloadKind::Waveform)]
    which: PayloadKind,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::SimulationNotFound(_) | CatalogError::CatalogIncomplete { .. } => 2,
        CatalogError::ArchiveHttp(_)
        | CatalogError::ArchiveStatus { .. }
        | CatalogError::PayloadNotFound(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = Store::new().into_diagnostic()?;

    match cli.command {
        Commands::Catalog(args) => run_catalog(args.command, store),
    }
}

fn run_catalog(command: CatalogCommand, store: Store) -> miette::Result<()> {
    match command {
        CatalogCommand::Sync(args) => {
            let config = resolve_sync_config(&args)?;
            let client = HttpArchiveClient::new().into_diagnostic()?;
            let mut catalog = Catalog::new(store, client, config);
            let simulations = catalog.load().into_diagnostic()?.len();
            let result = SyncResult {
                simulations,
                snapshot_path: catalog.store().snapshot_path().to_string(),
            };
            JsonOutput::print_sync(&result).into_diagnostic()?;
            Ok(())
        }
        CatalogCommand::List => {
            let table = store.read_snapshot().into_diagnostic()?;
            JsonOutput::print_list(&ListResult::from_table(&table)).into_diagnostic()?;
            Ok(())
        }
        CatalogCommand::Info(args) => {
            let name: SimulationName = args.simulation.parse().into_diagnostic()?;
            let table = store.read_snapshot().into_diagnostic()?;
            let record = table
                .get(&name)
                .ok_or_else(|| CatalogError::SimulationNotFound(name.to_string()))
                .into_diagnostic()?;
            JsonOutput::print_info(record).into_diagnostic()?;
            Ok(())
        }
        CatalogCommand::Fetch(args) => {
            let name: SimulationName = args.simulation.parse().into_diagnostic()?;
            let client = HttpArchiveClient::new().into_diagnostic()?;
            let catalog = Catalog::new(store, client, CrawlConfig::default());
            let path = catalog
                .download_payload(&name, args.which)
                .into_diagnostic()?;
            let result = FetchResult {
                simulation_name: name.to_string(),
                kind: args.which.to_string(),
                path: path.to_string(),
            };
            JsonOutput::print_fetch(&result).into_diagnostic()?;
            Ok(())
        }
        CatalogCommand::FetchAll(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
            let limit = args.limit.unwrap_or(config.num_sims_to_crawl);
            let client = HttpArchiveClient::new().into_diagnostic()?;
            let mut catalog = Catalog::new(store, client, config);
            catalog.load().into_diagnostic()?;
            let fetched = catalog
                .download_payloads(args.which, limit)
                .into_diagnostic()?;
            for (name, path) in &fetched {
                let result = FetchResult {
                    simulation_name: name.to_string(),
                    kind: args.which.to_string(),
                    path: path.to_string(),
                };
                JsonOutput::print_fetch(&result).into_diagnostic()?;
            }
            Ok(())
        }
        CatalogCommand::Clear => {
            store.clear().into_diagnostic()?;
            JsonOutput::print_clear(&ClearResult { cleared: true }).into_diagnostic()?;
            Ok(())
        }
    }
}

fn resolve_sync_config(args: &SyncArgs) -> miette::Result<CrawlConfig> {
    let mut config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    if let Some(limit) = args.limit {
        config.num_sims_to_crawl = limit;
    }
    if args.download {
        config.download = true;
    }
    if args.no_cache {
        config.use_cache = false;
    }
    Ok(config)
}
