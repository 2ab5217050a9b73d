use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odex::commands::items::ItemFilter;
use odex::commands::url::UrlArgs;
use odex::config::ExplorerConfig;
use odex::explorer::Explorer;
use odex::output::Format;
use odex::plan::{FilterSpec, OrderSpec};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "odex",
    version,
    about = "Build OData query URLs from a service's $metadata"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Explorer config file (YAML or JSON); defaults to $ODEX_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Configured endpoint name, or a service URL
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// $metadata document (JSON) for the endpoint
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List queryable entities in inheritance order
    Entities,
    /// List an entity's properties and navigation properties
    Items {
        /// Entity type or entity set name
        entity: String,
        /// Only properties
        #[arg(long, conflicts_with = "navigation")]
        properties: bool,
        /// Only navigation properties
        #[arg(long, conflicts_with = "properties")]
        navigation: bool,
    },
    /// List the filter operators for a property path (e.g. Category/Name)
    Operators {
        /// Entity type or entity set name
        entity: String,
        /// Property path, navigations separated by '/'
        path: String,
    },
    /// Print the query URL
    Url {
        /// Entity type or entity set name
        entity: Option<String>,
        /// Query plan file (YAML or JSON)
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Page size ($top)
        #[arg(long)]
        top: Option<u64>,
        /// Rows to skip ($skip)
        #[arg(long)]
        skip: Option<u64>,
        /// Where filter as path|operator|value (repeatable)
        #[arg(long = "filter")]
        filter: Vec<FilterSpec>,
        /// Sort term: Name, "Name desc" or Name:desc (repeatable)
        #[arg(long = "order-by")]
        order_by: Vec<OrderSpec>,
        /// Properties to select (comma-separated)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        /// Navigation properties to expand (comma-separated)
        #[arg(long, value_delimiter = ',')]
        expand: Vec<String>,
        /// Zero-based page number; requires a page size
        #[arg(long)]
        page: Option<u64>,
    },
    /// Render a result payload as a table
    Results {
        /// Payload file; '-' or omitted reads stdin
        file: Option<PathBuf>,
        /// Table title
        #[arg(long)]
        title: Option<String>,
    },
    /// List configured endpoints
    Endpoints,
    /// Show version and configuration details
    Info,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli, format: Format) -> odex::error::Result<()> {
    let config = ExplorerConfig::discover(cli.config.as_deref())?;

    // Commands that need no metadata
    match &cli.command {
        Commands::Endpoints => return odex::commands::endpoints::run(&config, format),
        Commands::Info => return odex::commands::info::run(&config, format),
        Commands::Results { file, title } => {
            return odex::commands::results::run(file.as_deref(), title.as_deref(), format);
        }
        _ => {}
    }

    let mut explorer = Explorer::new(config);
    let endpoint = explorer.endpoint_from_args(
        cli.endpoint.as_deref(),
        cli.metadata.as_deref(),
    )?;
    let builder = explorer.builder_for(&endpoint)?;

    match cli.command {
        Commands::Endpoints | Commands::Info | Commands::Results { .. } => unreachable!(),
        Commands::Entities => odex::commands::entities::run(builder.catalog(), format),
        Commands::Items {
            entity,
            properties,
            navigation,
        } => {
            let filter = match (properties, navigation) {
                (true, _) => ItemFilter::Properties,
                (_, true) => ItemFilter::Navigation,
                _ => ItemFilter::All,
            };
            odex::commands::items::run(builder.catalog(), &entity, filter, format)
        }
        Commands::Operators { entity, path } => {
            odex::commands::operators::run(builder.catalog(), &entity, &path, format)
        }
        Commands::Url {
            entity,
            plan,
            top,
            skip,
            filter,
            order_by,
            select,
            expand,
            page,
        } => odex::commands::url::run(
            builder,
            UrlArgs {
                entity,
                plan,
                top,
                skip,
                filters: filter,
                order_by,
                select,
                expand,
                page,
            },
            format,
        ),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    init_tracing();
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
