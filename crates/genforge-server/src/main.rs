//! GenForge: artifact generation gateway with template fallback.

use std::path::PathBuf;
use std::sync::Arc;

use genforge_core::ForgeConfig;
use genforge_runtime::Orchestrator;
use genforge_server::routes;
use genforge_server::state::AppState;
use genforge_store::ArtifactStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LIST_LIMIT: usize = 10;

fn resolve_data_dir() -> PathBuf {
    std::env::var("GENFORGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

/// `genforge list [limit]`: print recent artifacts, newest first.
fn list_artifacts(limit: usize) -> anyhow::Result<()> {
    let config = ForgeConfig::from_env(resolve_data_dir())?;
    let store = ArtifactStore::open(&config.data_paths.artifacts)?;
    let artifacts = store.list(limit)?;
    if artifacts.is_empty() {
        println!("No artifacts in {}", store.db_path().display());
        return Ok(());
    }
    for a in artifacts {
        let created = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(a.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:<40} {:>9} B  {:<24} {}  {}",
            a.name,
            a.size,
            a.content_type,
            created,
            a.produced_by.summary()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "list" | "--list" => {
                let limit = match args.get(2) {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid limit: {}", raw))?,
                    None => DEFAULT_LIST_LIMIT,
                };
                return list_artifacts(limit);
            }
            "--help" | "-h" | "help" => {
                println!("GenForge: application and image generation gateway");
                println!();
                println!("Usage: genforge [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  list [limit]             List recent artifacts (default 10)");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'genforge help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();

    info!("Data directory: {}", data_dir.display());

    let config = ForgeConfig::from_env(&data_dir)?;
    let port = config.port;

    let orchestrator = Orchestrator::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize orchestrator: {}", e))?;

    let state = Arc::new(AppState::new(config, orchestrator));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("GenForge server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
