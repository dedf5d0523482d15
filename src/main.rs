use clap::Parser;
use fincabot_api::{AppContext, RestApi};
use fincabot_llm::{ClaudeConfig, ClaudeGenerator, OpenAiConfig, OpenAiGenerator, ResponseGenerator};
use fincabot_store::{create_store, BackendKind, ListingStore, StorageMode, StoreConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Conversational real-estate search assistant
#[derive(Parser, Debug)]
#[command(name = "fincabot")]
#[command(about = "Conversational real-estate search assistant", long_about = None)]
struct Args {
    /// Path to the persistence directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Path to the XML listing feed
    #[arg(long, default_value = "./data/listings.xml")]
    feed: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Index backend: hnsw | flat
    #[arg(long, default_value = "hnsw")]
    backend: String,

    /// Storage mode override: memory | disk (default: probe the data
    /// directory for an existing index)
    #[arg(long)]
    storage_mode: Option<String>,

    /// Embedding model identifier
    #[arg(long)]
    embed_model: Option<String>,

    /// Response generator: openai | claude | none
    #[arg(long, default_value = "none")]
    llm: String,

    /// Force reload of the listing index from the feed
    #[arg(long)]
    reload_listings: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fincabot v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = args
        .data_dir
        .or_else(|| std::env::var("FINCABOT_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./data"));
    let embed_model = args
        .embed_model
        .or_else(|| std::env::var("FINCABOT_EMBED_MODEL").ok())
        .unwrap_or_else(|| fincabot_core::DEFAULT_MODEL.to_string());

    let backend = BackendKind::parse(&args.backend)?;
    let mode_env = std::env::var("FINCABOT_STORAGE_MODE").ok();
    let mode = StorageMode::resolve(
        args.storage_mode.as_deref(),
        mode_env.as_deref(),
        &data_dir,
        backend,
    )?;

    info!("Data directory: {:?}", data_dir);
    info!("Backend: {:?}, storage mode: {:?}, model: {}", backend, mode, embed_model);

    let store = create_store(&StoreConfig {
        backend,
        mode,
        embed_model,
    })?;
    initialize_store(store.as_ref(), &args.feed, args.reload_listings)?;

    let generator = create_generator(&args.llm)?;
    let context = AppContext {
        store: Arc::from(store),
        generator,
    };

    info!("HTTP API: http://localhost:{}/", args.http_port);
    RestApi::start(context, args.http_port).await?;

    info!("Shutting down...");
    Ok(())
}

/// Run ingestion when the store has no index yet, or unconditionally when a
/// reload was requested. A load failure aborts startup - serving a
/// partially loaded store would silently answer from bad data.
fn initialize_store(
    store: &dyn ListingStore,
    feed: &Path,
    force_reload: bool,
) -> anyhow::Result<()> {
    if force_reload || store.needs_loading() {
        info!("Loading listings from feed and rebuilding the index...");
        let listings = fincabot_feed::load_listings(feed)?;
        store.load(&listings)?;
        info!("Loaded {} listings into the index", listings.len());
    } else {
        info!("Using existing listing index ({} documents)", store.len());
    }
    Ok(())
}

fn create_generator(kind: &str) -> anyhow::Result<Option<Arc<dyn ResponseGenerator>>> {
    match kind {
        "none" => Ok(None),
        "openai" => Ok(Some(Arc::new(OpenAiGenerator::new(OpenAiConfig::default())?))),
        "claude" => Ok(Some(Arc::new(ClaudeGenerator::new(ClaudeConfig::default())?))),
        other => anyhow::bail!("unsupported response generator: {other}"),
    }
}
