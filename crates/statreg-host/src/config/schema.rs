use std::collections::HashSet;

use serde::Deserialize;
use statreg_core::error::{Result, StatRegError};
use statreg_core::StatGroup;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub version: u32,

    #[serde(default)]
    pub group: GroupSection,

    #[serde(default)]
    pub sink: SinkSection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub counters: Vec<CounterDecl>,
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatRegError::UnsupportedVersion);
        }

        self.group.validate()?;
        self.http.validate()?;

        let mut seen: HashSet<(CounterKind, &str)> = HashSet::new();
        for c in &self.counters {
            c.validate()?;
            // Counter and accumulator variants share one namespace.
            if !seen.insert((c.kind.namespace_key(), c.name.as_str())) {
                return Err(StatRegError::BadConfig(format!(
                    "counters: duplicate {} name '{}'",
                    c.kind.as_str(),
                    c.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSection {
    #[serde(default = "default_group_name")]
    pub name: String,

    #[serde(default = "default_group_category")]
    pub category: String,
}

impl Default for GroupSection {
    fn default() -> Self {
        Self {
            name: default_group_name(),
            category: default_group_category(),
        }
    }
}

impl GroupSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StatRegError::BadConfig("group.name must not be empty".into()));
        }
        Ok(())
    }

    pub fn to_stat_group(&self) -> StatGroup {
        StatGroup {
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

fn default_group_name() -> String {
    "Script".into()
}
fn default_group_category() -> String {
    "advanced".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSection {
    #[serde(default = "default_collecting")]
    pub collecting: bool,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            collecting: default_collecting(),
        }
    }
}

fn default_collecting() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_listen(),
        }
    }
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(StatRegError::BadConfig(
                "http.listen must be a valid socket address".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:9464".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Cycle,
    Timer,
    Int64Counter,
    Int64Accumulator,
    DoubleCounter,
    DoubleAccumulator,
    Memory,
}

impl CounterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterKind::Cycle => "cycle",
            CounterKind::Timer => "timer",
            CounterKind::Int64Counter => "int64_counter",
            CounterKind::Int64Accumulator => "int64_accumulator",
            CounterKind::DoubleCounter => "double_counter",
            CounterKind::DoubleAccumulator => "double_accumulator",
            CounterKind::Memory => "memory",
        }
    }

    fn namespace_key(self) -> CounterKind {
        match self {
            CounterKind::Int64Accumulator => CounterKind::Int64Counter,
            CounterKind::DoubleAccumulator => CounterKind::DoubleCounter,
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterDecl {
    pub kind: CounterKind,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Timers only.
    #[serde(default)]
    pub scale: Option<f64>,
}

impl CounterDecl {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StatRegError::BadConfig("counters[].name must not be empty".into()));
        }
        match (self.kind, self.scale) {
            (CounterKind::Timer, Some(s)) if !(s.is_finite() && s > 0.0) => {
                Err(StatRegError::BadConfig(format!(
                    "counter '{}': scale must be finite and positive",
                    self.name
                )))
            }
            (CounterKind::Timer, _) | (_, None) => Ok(()),
            (kind, Some(_)) => Err(StatRegError::BadConfig(format!(
                "counter '{}': scale is only valid for timers (kind={})",
                self.name,
                kind.as_str()
            ))),
        }
    }

    pub fn scale_or_default(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }
}
