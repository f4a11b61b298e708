pub mod defaults;
pub mod init;
pub mod load;
pub mod model;

pub use defaults::{DEFAULT_BACKUP_TO, DEFAULT_CONFIG, DEFAULT_CONFIG_FILENAME, DEFAULT_CONFIG_PATH};
pub use init::init_config;
pub use load::{expand, load_config, parse_config};
pub use model::{Config, ConfigFile};
