//! Configuration loading.

mod settings;

pub use settings::{
    expand_env_vars, FilterSettings, MirrorSettings, Settings, SettingsError, UsageSettings,
    WarehouseSettings, WorkerSettings,
};
