use std::collections::HashSet;

use serde::Deserialize;
use tally_core::error::{Result, TallyError};

use crate::registry::validate_id;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub registry: RegistrySection,

    /// Counters created at startup.
    #[serde(default)]
    pub counters: Vec<CounterSeed>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.registry.validate()?;

        if self.counters.len() > self.registry.max_instances {
            return Err(TallyError::BadRequest(
                "counters exceed registry.max_instances".into(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &self.counters {
            validate_id(&c.id)
                .map_err(|e| TallyError::BadRequest(format!("counters: {e}")))?;
            if !seen.insert(c.id.as_str()) {
                return Err(TallyError::BadRequest(format!(
                    "counters: duplicate id {}",
                    c.id
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(TallyError::BadRequest(
                "gateway.listen must be a valid SocketAddr".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(TallyError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(TallyError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(TallyError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(64..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(TallyError::BadRequest(
                "gateway.max_frame_bytes must be between 64 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    4096
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    #[serde(default = "default_max_instances")]
    pub max_instances: usize,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            max_instances: default_max_instances(),
        }
    }
}

impl RegistrySection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1_000_000).contains(&self.max_instances) {
            return Err(TallyError::BadRequest(
                "registry.max_instances must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_instances() -> usize {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterSeed {
    pub id: String,
}
