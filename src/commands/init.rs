//! Init command implementation

use crate::config::Config;
use crate::db::ContentDb;
use crate::error::{Error, Result};
use crate::index::QdrantIndex;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub force: bool,
}

/// Initialize currigen configuration, content database and collection
pub async fn cmd_init(options: InitOptions) -> Result<()> {
    let mut config = Config::default();
    config.paths.base_dir = options.base_dir.clone();
    config.paths.config_file = options.base_dir.join("config.toml");
    config.paths.db_file = options.base_dir.join("content.db");

    if config.paths.config_file.exists() && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.save()?;

    // Create the content database and apply the schema
    ContentDb::connect(&config.paths.db_file).await?;
    info!("Content database ready at {:?}", config.paths.db_file);

    // Create the vector collection if Qdrant is reachable; a missing
    // server is not fatal here since ingest also ensures the collection
    match QdrantIndex::connect(&config).await {
        Ok(index) => match index.ensure_collection().await {
            Ok(()) => info!("Collection '{}' ready", config.collection_name),
            Err(e) => info!("Qdrant not ready yet ({}); collection will be created on ingest", e),
        },
        Err(e) => info!("Qdrant not reachable ({}); collection will be created on ingest", e),
    }

    println!(
        "Initialized currigen at {}",
        config.paths.base_dir.display()
    );
    Ok(())
}
