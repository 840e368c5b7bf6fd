use capgate::app::App;
use capgate::services::logger::{LogLevel, Logger};
use capgate::spec::load_capability;
use capgate::utils::paths::resolve_capability_path;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "capgate", version, about = "Declarative capability gateway")]
struct Cli {
    /// Capability document (YAML or JSON).
    capability: Option<PathBuf>,

    /// Load and validate the capability, print a summary, then exit.
    #[arg(long)]
    check: bool,

    /// Overrides CAPGATE_LOG_LEVEL.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut logger = Logger::new("capgate");
    if let Some(level) = cli.log_level.as_deref().and_then(LogLevel::parse) {
        logger.set_level(level);
    }

    let path = resolve_capability_path(cli.capability.as_deref());
    let loaded =
        load_capability(&path).and_then(|document| App::initialize(document, logger.clone()));
    let app = match loaded {
        Ok(app) => app,
        Err(err) => {
            let meta = err
                .hint
                .as_ref()
                .map(|hint| serde_json::json!({ "hint": hint }));
            logger.error(&err.to_string(), meta.as_ref());
            std::process::exit(1);
        }
    };

    if cli.check {
        println!(
            "{}",
            serde_json::to_string_pretty(&app.summary()).unwrap_or_default()
        );
        return;
    }

    logger.info(
        "capability loaded",
        Some(&serde_json::json!({ "path": path.display().to_string() })),
    );
    if let Err(err) = app.run().await {
        logger.error(&err.to_string(), None);
        std::process::exit(1);
    }
}
