//! netctl-meta - Setting Metadata Library
//!
//! Static metadata used by the netctl connection tools:
//! - Setting priority registry (setting names, implementation types, priority bands)
//! - 802.1x credential scheme registry (certificate and private-key fields)
//! - Connection profile files and their credential encoding
//! - Tool configuration

pub mod error;
pub mod validation;
pub mod setting;
pub mod credential;
pub mod profile;
pub mod config;

// Re-export commonly used types
pub use error::{MetaError, MetaResult};
pub use setting::{
    MetaSettingType, Setting, SettingPriority, SettingTypeEntry, TypeHandle, TypeInfo,
};
pub use credential::{
    CredentialField, CredentialFieldEntry, CredentialFormat, CredentialHolder, CredentialKind,
    CredentialValue, SchemeTag, SecretFlags, Setting8021x,
};
pub use profile::{ConnectionProfile, ProfileManager};
pub use config::MetaConfig;
