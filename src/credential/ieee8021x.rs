//! 802.1x setting (equivalent to NMSetting8021x)

use super::{Credential, CredentialField, CredentialHolder, KeyPassword};
use crate::setting::types::{builtin, TypeHandle};
use crate::setting::Setting;

/// 802.1x authentication setting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setting8021x {
    /// EAP methods (tls, peap, ttls, ...)
    pub eap: Vec<String>,
    /// Identity
    pub identity: Option<String>,
    /// Anonymous outer identity
    pub anonymous_identity: Option<String>,
    /// Phase 2 (inner) authentication method
    pub phase2_auth: Option<String>,
    ca_cert: Credential,
    phase2_ca_cert: Credential,
    client_cert: Credential,
    phase2_client_cert: Credential,
    private_key: Credential,
    phase2_private_key: Credential,
    private_key_password: KeyPassword,
    phase2_private_key_password: KeyPassword,
}

impl Setting8021x {
    pub const SETTING_NAME: &'static str = "802-1x";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Setting for Setting8021x {
    fn type_handle(&self) -> TypeHandle {
        TypeHandle::of(&builtin::IEEE_8021X)
    }
}

impl CredentialHolder for Setting8021x {
    fn credential(&self, field: CredentialField) -> Option<&Credential> {
        match field {
            CredentialField::CaCert => Some(&self.ca_cert),
            CredentialField::Phase2CaCert => Some(&self.phase2_ca_cert),
            CredentialField::ClientCert => Some(&self.client_cert),
            CredentialField::Phase2ClientCert => Some(&self.phase2_client_cert),
            CredentialField::PrivateKey => Some(&self.private_key),
            CredentialField::Phase2PrivateKey => Some(&self.phase2_private_key),
            CredentialField::Unknown => None,
        }
    }

    fn credential_mut(&mut self, field: CredentialField) -> Option<&mut Credential> {
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

    fn key_password(&self, field: CredentialField) -> Option<&KeyPassword> {
        match field {
            CredentialField::PrivateKey => Some(&self.private_key_password),
            CredentialField::Phase2PrivateKey => Some(&self.phase2_private_key_password),
            _ => None,
        }
    }

    fn key_password_mut(&mut self, field: CredentialField) -> Option<&mut KeyPassword> {
        match field {
            CredentialField::PrivateKey => Some(&mut self.private_key_password),
            CredentialField::Phase2PrivateKey => Some(&mut self.phase2_private_key_password),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::SchemeTag;
    use crate::setting::{lookup_by_setting, SettingPriority};

    #[test]
    fn test_resolves_to_registry_entry() {
        let setting = Setting8021x::new();
        let entry = lookup_by_setting(&setting).unwrap();
        assert_eq!(entry.name, Setting8021x::SETTING_NAME);
        assert_eq!(entry.priority, SettingPriority::HwAux);
    }

    #[test]
    fn test_every_field_has_a_slot() {
        let setting = Setting8021x::new();
        for field in CredentialField::ALL {
            let credential = setting.credential(field).unwrap();
            assert_eq!(credential.scheme(), SchemeTag::None);
            assert_eq!(setting.key_password(field).is_some(), field.entry().is_secret);
        }
        assert!(setting.credential(CredentialField::Unknown).is_none());
    }
}
