//! Host config loader (strict parsing).

pub mod schema;

use std::fs;

use statreg_core::error::{Result, StatRegError};

pub use schema::{CounterDecl, CounterKind, GroupSection, HostConfig, HttpSection, SinkSection};

pub fn load_from_file(path: &str) -> Result<HostConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatRegError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<HostConfig> {
    let cfg: HostConfig = serde_yaml::from_str(s)
        .map_err(|e| StatRegError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
