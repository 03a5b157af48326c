use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "bygder";
static DB_FILE_NAME: &str = "bygder.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

/// Number of root comments shown before "show more".
pub const DEFAULT_VISIBLE_ROOTS: usize = 2;

// data_dir_path
// |- bygder
//    |- bygder.sqlite
//    |- config.json

fn default_visible_roots() -> usize {
    DEFAULT_VISIBLE_ROOTS
}

fn default_log_filter() -> String {
    "bygder_core=info".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BygderConfig {
    pub database_path: PathBuf,

    /// Roots shown per discussion until the user asks for more.
    #[serde(default = "default_visible_roots")]
    pub visible_roots: usize,

    /// `tracing-subscriber` directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl BygderConfig {
    fn new(data_dir: &Path) -> Self {
        BygderConfig {
            database_path: data_dir.join(DB_FILE_NAME),
            visible_roots: default_visible_roots(),
            log_filter: default_log_filter(),
        }
    }

    /// sqlite connection string for [`crate::models::open_or_create_db`].
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }
}

/// Gets the config from the platform data directory, creating it on first use.
pub async fn get_or_init() -> Result<BygderConfig, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_dir().ok_or("no data directory on this platform")?;
    load_or_init_at(&data_dir.join(DATA_DIR_NAME)).await
}

/// Same as [`get_or_init`] rooted at `dir`.
pub async fn load_or_init_at(dir: &Path) -> Result<BygderConfig, Box<dyn std::error::Error>> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(dir).await?;

    if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: BygderConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        let config = BygderConfig::new(dir);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        Ok(config)
    }
}
