// ==========================================
// Schedule Import - configuration layer
// ==========================================
// Storage: config_kv table, scope 'global'
// ==========================================

pub mod config_manager;
pub mod import_config;

pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{ImportConfig, ImportConfigReader, DEFAULT_COLOR_PALETTE};
