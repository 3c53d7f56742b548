use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use salesquery::cli::{self as prog_cli, Command, OutputMode};
use salesquery::config::{AppConfig, BackendKind};
use salesquery::query::RawQuery;

#[derive(Parser, Debug)]
#[command(name = "salesq", version, about = "Filter, sort and page retail sales data", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). Overrides $SALESQ_CONFIG and the default locations.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Sales CSV file to load. Takes precedence over config/env.")]
    data: Option<PathBuf>,
    #[arg(long, value_enum, help = "Query evaluator. Takes precedence over config/env.")]
    backend: Option<BackendKind>,
    #[arg(long, help = "SQLite URL for the sqlite backend (e.g., sqlite://sales.db).")]
    database: Option<String>,
    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    #[arg(long, help = "Case-insensitive substring of the customer name, or substring of the phone number")]
    search: Option<String>,
    #[arg(long, help = "Comma-separated customer regions")]
    region: Option<String>,
    #[arg(long, help = "Comma-separated genders")]
    gender: Option<String>,
    #[arg(long, help = "Comma-separated age buckets: 18-25,26-35,36-50,51+")]
    age: Option<String>,
    #[arg(long, help = "Comma-separated product categories")]
    category: Option<String>,
    #[arg(long, help = "Comma-separated tags; a record matches if it carries any of them")]
    tags: Option<String>,
    #[arg(long, help = "Comma-separated payment methods")]
    payment: Option<String>,
    #[arg(long, help = "last7days|last30days|last90days|lastyear")]
    date_range: Option<String>,
    #[arg(long, help = "Display name of the sort field, e.g. \"Total Amount\"")]
    sort_by: Option<String>,
    #[arg(long, help = "asc|desc")]
    sort_order: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    limit: Option<String>,
}

impl From<QueryArgs> for RawQuery {
    fn from(a: QueryArgs) -> Self {
        Self {
            search: a.search,
            customer_region: a.region,
            gender: a.gender,
            age_range: a.age,
            product_category: a.category,
            tags: a.tags,
            payment_method: a.payment,
            date_range: a.date_range,
            sort_by: a.sort_by,
            sort_order: a.sort_order,
            page: a.page,
            limit: a.limit,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run a filtered, sorted, paginated query; prints one page as JSON")]
    Query(QueryArgs),
    #[command(about = "Print the filter option catalog as JSON")]
    Catalog,
    #[command(about = "Load the dataset and print the health report")]
    Health,
    #[command(about = "Load a CSV file into the configured SQLite database")]
    Import {
        #[arg(help = "Path to the sales CSV")]
        csv: PathBuf,
    },
    #[command(about = "Write the header and first N rows of a CSV to a new file")]
    Sample {
        #[arg(help = "Input CSV")]
        input: PathBuf,
        #[arg(help = "Output CSV")]
        output: PathBuf,
        #[arg(long, default_value_t = 500, help = "Data rows to keep")]
        rows: usize,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    // Precedence: CLI > env > config files > defaults
    let mut cfg = AppConfig {
        data_path: cli.data.clone(),
        backend: cli.backend,
        database_url: cli.database.clone(),
        ..AppConfig::default()
    };
    cfg.fill_from(AppConfig::load(cli.config.as_deref())?);
    Ok(cfg)
}

fn init_logging(cfg: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cfg.log_config {
        return salesquery::logger::init_path(path);
    }
    if cfg.log_dir.is_some() || cfg.log_level.is_some() {
        return salesquery::logger::configure_logging(
            cfg.log_dir.as_deref(),
            cfg.log_level.as_deref(),
            None,
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&cfg) {
        eprintln!("warning: logging disabled: {e}");
    }
    let mode = if cli.pretty { OutputMode::Pretty } else { OutputMode::Json };
    let cmd = match cli.command {
        Commands::Query(args) => Command::Query(args.into()),
        Commands::Catalog => Command::Catalog,
        Commands::Health => Command::Health,
        Commands::Import { csv } => Command::Import { csv },
        Commands::Sample { input, output, rows } => Command::Sample { input, output, rows },
    };
    let mut stdout = std::io::stdout().lock();
    match prog_cli::run(cmd, &cfg, mode, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
