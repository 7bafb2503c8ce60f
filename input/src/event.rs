use crate::codes;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self {
            sec: since_epoch.as_secs() as i64,
            usec: i64::from(since_epoch.subsec_micros()),
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.usec as f64 / 1_000_000.0
    }
}

/// A single record as read from an event device node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub time: Timestamp,
    pub type_: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub fn new(time: Timestamp, type_: u16, code: u16, value: i32) -> Self {
        Self {
            time,
            type_,
            code,
            value,
        }
    }

    pub fn syn_report(time: Timestamp) -> Self {
        Self::new(time, codes::EV_SYN, codes::SYN_REPORT, 0)
    }

    pub fn is_syn_report(&self) -> bool {
        self.type_ == codes::EV_SYN && self.code == codes::SYN_REPORT
    }

    pub fn is_syn_dropped(&self) -> bool {
        self.type_ == codes::EV_SYN && self.code == codes::SYN_DROPPED
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

impl AbsInfo {
    /// Maps `value` into `[0, 1]` over the axis range.
    pub fn normalize(&self, value: i32) -> f64 {
        let range = f64::from(self.maximum) - f64::from(self.minimum);
        if range <= 0.0 {
            return 0.0;
        }

        ((f64::from(value) - f64::from(self.minimum)) / range).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Other { type_: u16, code: u16 },
    Abs { code: u16, info: AbsInfo },
}

impl Capability {
    pub fn type_(&self) -> u16 {
        match *self {
            Capability::Other { type_, .. } => type_,
            Capability::Abs { .. } => codes::EV_ABS,
        }
    }

    pub fn code(&self) -> u16 {
        match *self {
            Capability::Other { code, .. } | Capability::Abs { code, .. } => code,
        }
    }
}

/// Snapshot of what an event device reports about itself when opened.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub phys: Option<String>,
    pub uniq: Option<String>,
    pub id: InputId,
    /// Packed as `major << 16 | minor << 8 | patch`, like `EVIOCGVERSION`.
    pub driver_version: u32,
    pub event_types: Vec<u16>,
    pub capabilities: Vec<Capability>,
    pub properties: Vec<u16>,
}

impl Device {
    pub fn has_type(&self, type_: u16) -> bool {
        self.event_types.contains(&type_)
    }

    pub fn has_code(&self, type_: u16, code: u16) -> bool {
        self.capabilities
            .iter()
            .any(|capability| capability.type_() == type_ && capability.code() == code)
    }

    pub fn has_property(&self, prop: u16) -> bool {
        self.properties.contains(&prop)
    }

    pub fn abs_info(&self, code: u16) -> Option<&AbsInfo> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::Abs { code: abs_code, info } if *abs_code == code => Some(info),
            _ => None,
        })
    }

    /// Supported codes of one event type, ascending.
    pub fn codes(&self, type_: u16) -> Vec<u16> {
        let mut codes: Vec<u16> = self
            .capabilities
            .iter()
            .filter(|capability| capability.type_() == type_)
            .map(Capability::code)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}
