//! Configuration for Orca
//!
//! `config.json` is read from the global config dir and then from the
//! project's `.orca/`; project values override global ones key by key.

mod orca;

pub use orca::{
    AgentSettings, DelegationSettings, FilterMode, OrcaConfig, ProcessSettings, ReviewSettings,
    ShellSettings, SubAgentConfig, TaskStoreSettings, ORCA_CONFIG_FILE,
};
