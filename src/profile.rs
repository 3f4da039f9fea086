//! Connection profile file reading and management
//!
//! Profiles are TOML files with one table per setting. The `[connection]` and
//! `[802-1x]` tables are typed; every other table is kept as-is.

use crate::credential::{
    self, decode_keyfile_value, encode_keyfile_value, CredentialField, SecretFlags, Setting8021x,
};
use crate::error::{MetaError, MetaResult};
use crate::setting::{self, SettingTypeEntry};
use crate::validation::{validate_profile_name, validate_setting_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Profile file extension
pub const PROFILE_EXTENSION: &str = "nctl";

/// Connection profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub connection: ConnectionSection,
    #[serde(rename = "802-1x", skip_serializing_if = "Option::is_none")]
    pub ieee8021x: Option<Ieee8021xSection>,
    /// Remaining setting tables, keyed by setting name
    #[serde(flatten)]
    pub settings: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSection {
    pub id: String,
    pub uuid: String,
    #[serde(rename = "type")]
    pub conn_type: String,
    #[serde(default)]
    pub autoconnect: bool,
    #[serde(rename = "interface-name", skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ieee8021xSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eap: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_ca_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_client_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_password: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub private_key_password_flags: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_private_key_password: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub phase2_private_key_password_flags: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Ieee8021xSection {
    /// Keyfile text of a credential field
    pub fn credential(&self, field: CredentialField) -> Option<&str> {
        match field {
            CredentialField::CaCert => self.ca_cert.as_deref(),
            CredentialField::Phase2CaCert => self.phase2_ca_cert.as_deref(),
            CredentialField::ClientCert => self.client_cert.as_deref(),
            CredentialField::Phase2ClientCert => self.phase2_client_cert.as_deref(),
            CredentialField::PrivateKey => self.private_key.as_deref(),
            CredentialField::Phase2PrivateKey => self.phase2_private_key.as_deref(),
            CredentialField::Unknown => None,
        }
    }

    fn credential_mut(&mut self, field: CredentialField) -> Option<&mut Option<String>> {
        match field {
            CredentialField::CaCert => Some(&mut self.ca_cert),
            CredentialField::Phase2CaCert => Some(&mut self.phase2_ca_cert),
            CredentialField::ClientCert => Some(&mut self.client_cert),
            CredentialField::Phase2ClientCert => Some(&mut self.phase2_client_cert),
            CredentialField::PrivateKey => Some(&mut self.private_key),
            CredentialField::Phase2PrivateKey => Some(&mut self.phase2_private_key),
            CredentialField::Unknown => None,
        }
    }

    fn password_mut(&mut self, field: CredentialField) -> Option<(&mut Option<String>, &mut u32)> {
        match field {
            CredentialField::PrivateKey => {
                Some((&mut self.private_key_password, &mut self.private_key_password_flags))
            }
            CredentialField::Phase2PrivateKey => Some((
                &mut self.phase2_private_key_password,
                &mut self.phase2_private_key_password_flags,
            )),
            _ => None,
        }
    }

    /// Stored password and raw flags of a private-key field
    pub fn password(&self, field: CredentialField) -> Option<(Option<&str>, u32)> {
        match field {
            CredentialField::PrivateKey => {
                Some((self.private_key_password.as_deref(), self.private_key_password_flags))
            }
            CredentialField::Phase2PrivateKey => Some((
                self.phase2_private_key_password.as_deref(),
                self.phase2_private_key_password_flags,
            )),
            _ => None,
        }
    }
}

fn parse_flags(field: CredentialField, bits: u32) -> MetaResult<SecretFlags> {
    SecretFlags::from_bits(bits).ok_or_else(|| {
        MetaError::InvalidParameter(format!("Unknown secret flag bits {:#x} for {}", bits, field))
    })
}

impl ConnectionProfile {
    /// New profile with a random UUID
    pub fn new(id: &str, conn_type: &str) -> Self {
        Self {
            connection: ConnectionSection {
                id: id.to_string(),
                uuid: Uuid::new_v4().to_string(),
                conn_type: conn_type.to_string(),
                autoconnect: false,
                interface_name: None,
            },
            ieee8021x: None,
            settings: BTreeMap::new(),
        }
    }

    /// Load profile from TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> MetaResult<Self> {
        let path = path.as_ref();
        info!("Loading profile from: {}", path.display());

        let contents = fs::read_to_string(path).await?;
        let profile: ConnectionProfile = toml::from_str(&contents)
            .map_err(|e| MetaError::ConfigError(format!("Invalid TOML: {}", e)))?;

        Ok(profile)
    }

    /// Save profile to TOML file
    pub async fn to_file<P: AsRef<Path>>(&self, path: P) -> MetaResult<()> {
        let path = path.as_ref();
        info!("Saving profile to: {}", path.display());

        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| MetaError::ConfigError(format!("Failed to serialize: {}", e)))?;

        fs::write(path, toml_str).await?;
        Ok(())
    }

    pub fn uuid(&self) -> MetaResult<Uuid> {
        Uuid::parse_str(&self.connection.uuid).map_err(|e| {
            MetaError::InvalidParameter(format!("Invalid UUID '{}': {}", self.connection.uuid, e))
        })
    }

    /// Setting names present in the profile
    pub fn setting_names(&self) -> Vec<&str> {
        let mut names = vec!["connection"];
        if self.ieee8021x.is_some() {
            names.push(Setting8021x::SETTING_NAME);
        }
        names.extend(self.settings.keys().map(String::as_str));
        names
    }

    /// Check identity, base type and that every table is a registered setting
    pub fn verify(&self) -> MetaResult<()> {
        self.uuid()?;

        let conn_type = self.connection.conn_type.as_str();
        validate_setting_name(conn_type)?;
        let base = setting::lookup_by_name(conn_type)
            .ok_or_else(|| MetaError::NotFound(format!("unknown connection type '{}'", conn_type)))?;
        if !base.is_base_type {
            return Err(MetaError::InvalidParameter(format!(
                "'{}' cannot be a connection type",
                conn_type
            )));
        }

        for name in self.setting_names() {
            validate_setting_name(name)?;
            if setting::lookup_by_name(name).is_none() {
                return Err(MetaError::NotFound(format!("unknown setting '{}'", name)));
            }
            if let Some(table) = self.settings.get(name) {
                if !table.is_table() {
                    return Err(MetaError::InvalidParameter(format!(
                        "setting '{}' must be a table",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Settings in the order their secrets are requested
    pub fn secrets_order(&self) -> MetaResult<Vec<&'static SettingTypeEntry>> {
        setting::order_for_secrets(self.setting_names())
    }

    /// Build the 802.1x setting, routing every credential through the scheme registry.
    ///
    /// Relative certificate paths are resolved against `base_dir`.
    pub fn to_setting_8021x(&self, base_dir: Option<&Path>) -> MetaResult<Option<Setting8021x>> {
        let Some(section) = &self.ieee8021x else {
            return Ok(None);
        };

        let mut setting = Setting8021x::new();
        setting.eap = section.eap.clone();
        setting.identity = section.identity.clone();
        setting.anonymous_identity = section.anonymous_identity.clone();
        setting.phase2_auth = section.phase2_auth.clone();

        for entry in credential::entries() {
            let mut password = None;
            if let Some((stored, bits)) = section.password(entry.field) {
                credential::set_secret_flags(entry.field, &mut setting, parse_flags(entry.field, bits)?)?;
                password = stored;
            }

            if let Some(text) = section.credential(entry.field) {
                let (scheme, data) = decode_keyfile_value(text, base_dir)?;
                credential::write(entry.field, &mut setting, Some(data.as_slice()), scheme, password)?;
            }
        }

        Ok(Some(setting))
    }

    /// Replace the `[802-1x]` table with the contents of `setting`.
    ///
    /// Passwords that an agent owns or that must not be saved are left out.
    pub fn store_setting_8021x(&mut self, setting: &Setting8021x) -> MetaResult<()> {
        let mut section = Ieee8021xSection {
            eap: setting.eap.clone(),
            identity: setting.identity.clone(),
            anonymous_identity: setting.anonymous_identity.clone(),
            phase2_auth: setting.phase2_auth.clone(),
            ..Default::default()
        };

        for entry in credential::entries() {
            if let Some(slot) = section.credential_mut(entry.field) {
                *slot = encode_keyfile_value(credential::read(entry.field, setting));
            }

            if entry.is_secret {
                let flags = credential::secret_flags(entry.field, setting)?;
                let stored = credential::password(entry.field, setting)?
                    .filter(|_| !flags.stored_externally())
                    .map(str::to_owned);
                if let Some((password, bits)) = section.password_mut(entry.field) {
                    *password = stored;
                    *bits = flags.bits();
                }
            }
        }

        self.ieee8021x = Some(section);
        Ok(())
    }
}

/// Profile directory manager
pub struct ProfileManager {
    profile_dir: PathBuf,
}

impl ProfileManager {
    /// Create a new profile manager
    pub fn new<P: AsRef<Path>>(profile_dir: P) -> Self {
        Self {
            profile_dir: profile_dir.as_ref().to_path_buf(),
        }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Path of a named profile; names cannot leave the profile directory
    pub fn profile_path(&self, name: &str) -> MetaResult<PathBuf> {
        validate_profile_name(name)?;
        Ok(self.profile_dir.join(format!("{}.{}", name, PROFILE_EXTENSION)))
    }

    /// Create profile directory if it doesn't exist
    pub async fn initialize(&self) -> MetaResult<()> {
        fs::create_dir_all(&self.profile_dir).await?;
        Ok(())
    }

    /// List all profile names, sorted
    pub async fn list_profiles(&self) -> MetaResult<Vec<String>> {
        let mut profiles = Vec::new();
        let mut entries = fs::read_dir(&self.profile_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION) {
                if let Some(name) = path.file_stem() {
                    profiles.push(name.to_string_lossy().to_string());
                }
            }
        }

        profiles.sort();
        Ok(profiles)
    }

    /// Load a profile by name
    pub async fn load_profile(&self, name: &str) -> MetaResult<ConnectionProfile> {
        ConnectionProfile::from_file(self.profile_path(name)?).await
    }

    /// Save a profile
    pub async fn save_profile(&self, name: &str, profile: &ConnectionProfile) -> MetaResult<()> {
        profile.to_file(self.profile_path(name)?).await
    }

    /// Delete a profile
    pub async fn delete_profile(&self, name: &str) -> MetaResult<()> {
        fs::remove_file(self.profile_path(name)?).await?;
        Ok(())
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new("/etc/netctl/connections")
    }
}
