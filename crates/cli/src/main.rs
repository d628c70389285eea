use clap::{Parser, Subcommand};
use coordinator::geocoding::{to_address_text, to_coordinate_text, GeocodeResult, GeocodingClient};

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(
    about = "Coordinator: Messenger bot that looks up coordinates and addresses",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: COORDINATOR_CONFIG_PATH or ~/.coordinator/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway. Needs ACCESS_TOKEN and VERIFY_TOKEN (or the matching config keys).
    Serve {
        /// Config file path (default: COORDINATOR_CONFIG_PATH or ~/.coordinator/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Geocode one address from the command line and print the answer the bot would send.
    Lookup {
        /// Config file path (default: COORDINATOR_CONFIG_PATH or ~/.coordinator/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Print the full address instead of coordinates.
        #[arg(long)]
        address: bool,

        /// Free-text address to look up.
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Subscribe the page and apply greeting, get-started button and persistent menu, then exit.
    Setup {
        /// Config file path (default: COORDINATOR_CONFIG_PATH or ~/.coordinator/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("coordinator {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Lookup {
            config,
            address,
            query,
        }) => {
            if let Err(e) = run_lookup(config, address, query.join(" ")).await {
                log::error!("lookup failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Setup { config }) => {
            if let Err(e) = run_setup(config).await {
                log::error!("setup failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(coordinator::config::default_config_path);
    let dir = coordinator::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = coordinator::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    coordinator::gateway::run_gateway(config).await
}

async fn run_lookup(
    config_path: Option<std::path::PathBuf>,
    address: bool,
    query: String,
) -> anyhow::Result<()> {
    let (config, _) = coordinator::config::load_config(config_path)?;
    let client = GeocodingClient::new(
        Some(config.geocoding.base_url.clone()),
        coordinator::config::resolve_geocoding_key(&config),
        Some(config.geocoding.timeout()),
    );
    match client.lookup(&query).await? {
        GeocodeResult::Found(location) => {
            let text = if address {
                to_address_text(&location)
            } else {
                to_coordinate_text(&location)
            };
            println!("{}", text);
        }
        GeocodeResult::NotFound => println!("not found"),
    }
    Ok(())
}

async fn run_setup(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _) = coordinator::config::load_config(config_path)?;
    coordinator::gateway::configure_page(&config).await?;
    println!("messenger page configured");
    Ok(())
}
