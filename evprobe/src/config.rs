use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use input::dispatch::DEFAULT_SEAT;
use input::info::BlockFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "EVPROBE_";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Monitor {
    pub subsystem: Option<String>,
    pub devtype: Option<String>,
    pub interval_ms: u64,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            subsystem: None,
            devtype: None,
            interval_ms: 500,
        }
    }
}

impl Monitor {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Net {
    pub class_path: PathBuf,
}

impl Default for Net {
    fn default() -> Self {
        Self {
            class_path: PathBuf::from("/sys/class/net"),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Block {
    pub include_partitions: bool,
    pub include_loop: bool,
}

impl Block {
    pub fn filter(&self) -> BlockFilter {
        BlockFilter {
            include_partitions: self.include_partitions,
            include_loop: self.include_loop,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub require_root: bool,
    pub seat: String,
    pub monitor: Monitor,
    pub net: Net,
    pub block: Block,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            require_root: true,
            seat: String::from(DEFAULT_SEAT),
            monitor: Monitor::default(),
            net: Net::default(),
            block: Block::default(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the file at `path` if it exists, overridden by
    /// `EVPROBE_` variables (`EVPROBE_MONITOR__INTERVAL_MS=100`).
    pub fn new(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .split("__")
                    .map(|key| key.as_str().replace('_', "-").into()),
            )
            .extract()
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
