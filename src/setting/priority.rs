//! Setting priority bands

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation band of a setting type.
///
/// Lower bands must be satisfiable (hardware present, device unlocked) before
/// higher bands are attempted. Secrets are requested in ascending order.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingPriority {
    /// Sentinel, never assigned to a registered setting
    Invalid = 0,
    /// The meta-setting describing profile type and identity
    Connection = 1,
    /// Hardware bearer settings that can be a profile's base type
    HwBase = 2,
    /// Hardware-adjacent settings that are not valid base types
    HwNonBase = 3,
    /// Settings that depend on a base hardware setting
    HwAux = 4,
    /// Hardware-independent prerequisites for IP connectivity
    Aux = 5,
    /// IP-layer configuration
    Ip = 6,
    /// Free-form user metadata, always last
    User = 10,
}

impl SettingPriority {
    /// Numeric band value
    pub const fn value(self) -> u32 {
        self as u32
    }

    /// Band name as used in listings
    pub const fn as_str(self) -> &'static str {
        match self {
            SettingPriority::Invalid => "invalid",
            SettingPriority::Connection => "connection",
            SettingPriority::HwBase => "hw-base",
            SettingPriority::HwNonBase => "hw-non-base",
            SettingPriority::HwAux => "hw-aux",
            SettingPriority::Aux => "aux",
            SettingPriority::Ip => "ip",
            SettingPriority::User => "user",
        }
    }
}

impl fmt::Display for SettingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
