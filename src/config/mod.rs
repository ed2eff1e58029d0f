// src/config/mod.rs
pub mod archive;

pub use archive::{
    ArchiveConfig, NetworkConfig, NotifyConfig, ScheduleConfig, SearchConfig, StorageConfig,
    DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH,
};
