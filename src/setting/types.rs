//! Setting implementation type descriptors
//!
//! A [`TypeInfo`] describes one concrete or abstract setting implementation and
//! links to its parent. Descriptors live in static memory and a [`TypeHandle`]
//! compares them by identity, so two descriptors with the same name are still
//! distinct types.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

/// Upper bound on the length of any parent chain that is walked.
pub const MAX_TYPE_DEPTH: usize = 8;

/// Static descriptor of a setting implementation type
#[derive(Debug)]
pub struct TypeInfo {
    name: &'static str,
    parent: Option<&'static TypeInfo>,
}

impl TypeInfo {
    /// Descriptor without a parent
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Descriptor deriving from `parent`
    pub const fn derived(name: &'static str, parent: &'static TypeInfo) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static TypeInfo> {
        self.parent
    }
}

/// Opaque handle to a setting implementation type
#[derive(Clone, Copy)]
pub struct TypeHandle(&'static TypeInfo);

impl TypeHandle {
    pub const fn of(info: &'static TypeInfo) -> Self {
        Self(info)
    }

    /// Implementation type name
    pub fn name(self) -> &'static str {
        self.0.name
    }

    /// Direct parent type, if any
    pub fn parent(self) -> Option<TypeHandle> {
        self.0.parent.map(TypeHandle)
    }

    /// Iterate over this type and its ancestors, nearest first.
    ///
    /// The walk stops after [`MAX_TYPE_DEPTH`] steps.
    pub fn ancestry(self) -> impl Iterator<Item = TypeHandle> {
        std::iter::successors(Some(self), |handle| handle.parent()).take(MAX_TYPE_DEPTH)
    }

    /// Whether this type is `other` or derives from it within the depth bound
    pub fn is_a(self, other: TypeHandle) -> bool {
        self.ancestry().any(|handle| handle == other)
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.0, state)
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.0.name)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0.name)
    }
}

impl Serialize for TypeHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.name)
    }
}

macro_rules! derived_types {
    ($parent:ident => { $($ident:ident = $name:literal),* $(,)? }) => {
        $(pub static $ident: TypeInfo = TypeInfo::derived($name, &$parent);)*
    };
}

/// Descriptors for the built-in setting implementations
pub mod builtin {
    use super::TypeInfo;

    /// Abstract root of every setting implementation (not registered)
    pub static SETTING: TypeInfo = TypeInfo::root("CRSetting");

    /// Abstract base of the IPv4/IPv6 settings (not registered)
    pub static IP_CONFIG: TypeInfo = TypeInfo::derived("CRSettingIPConfig", &SETTING);

    derived_types!(IP_CONFIG => {
        IP4_CONFIG = "CRSettingIP4Config",
        IP6_CONFIG = "CRSettingIP6Config",
    });

    derived_types!(SETTING => {
        SIX_LOWPAN = "CRSetting6Lowpan",
        OLPC_MESH = "CRSettingOlpcMesh",
        WIRELESS = "CRSettingWireless",
        WIRELESS_SECURITY = "CRSettingWirelessSecurity",
        IEEE_8021X = "CRSetting8021x",
        WIRED = "CRSettingWired",
        ADSL = "CRSettingAdsl",
        BLUETOOTH = "CRSettingBluetooth",
        BOND = "CRSettingBond",
        BOND_PORT = "CRSettingBondPort",
        BRIDGE = "CRSettingBridge",
        BRIDGE_PORT = "CRSettingBridgePort",
        CDMA = "CRSettingCdma",
        CONNECTION = "CRSettingConnection",
        DCB = "CRSettingDcb",
        DUMMY = "CRSettingDummy",
        ETHTOOL = "CRSettingEthtool",
        GENERIC = "CRSettingGeneric",
        GSM = "CRSettingGsm",
        HOSTNAME = "CRSettingHostname",
        INFINIBAND = "CRSettingInfiniband",
        IP_TUNNEL = "CRSettingIPTunnel",
        LINK = "CRSettingLink",
        LOOPBACK = "CRSettingLoopback",
        MACSEC = "CRSettingMacsec",
        MACVLAN = "CRSettingMacvlan",
        MATCH = "CRSettingMatch",
        OVS_BRIDGE = "CRSettingOvsBridge",
        OVS_DPDK = "CRSettingOvsDpdk",
        OVS_EXTERNAL_IDS = "CRSettingOvsExternalIDs",
        OVS_INTERFACE = "CRSettingOvsInterface",
        OVS_OTHER_CONFIG = "CRSettingOvsOtherConfig",
        OVS_PATCH = "CRSettingOvsPatch",
        OVS_PORT = "CRSettingOvsPort",
        PPP = "CRSettingPpp",
        PPPOE = "CRSettingPppoe",
        PROXY = "CRSettingProxy",
        SERIAL = "CRSettingSerial",
        SRIOV = "CRSettingSriov",
        TC_CONFIG = "CRSettingTCConfig",
        TEAM = "CRSettingTeam",
        TEAM_PORT = "CRSettingTeamPort",
        TUN = "CRSettingTun",
        USER = "CRSettingUser",
        VETH = "CRSettingVeth",
        VLAN = "CRSettingVlan",
        VPN = "CRSettingVpn",
        VRF = "CRSettingVrf",
        VXLAN = "CRSettingVxlan",
        WIFI_P2P = "CRSettingWifiP2P",
        WIMAX = "CRSettingWimax",
        WIREGUARD = "CRSettingWireGuard",
        WPAN = "CRSettingWpan",
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    static LOOPING_A: TypeInfo = TypeInfo::derived("LoopingA", &LOOPING_B);
    static LOOPING_B: TypeInfo = TypeInfo::derived("LoopingB", &LOOPING_A);

    #[test]
    fn test_handles_compare_by_identity() {
        static SHADOW: TypeInfo = TypeInfo::derived("CRSettingWireless", &builtin::SETTING);

        let wireless = TypeHandle::of(&builtin::WIRELESS);
        assert_eq!(wireless, TypeHandle::of(&builtin::WIRELESS));
        assert_ne!(wireless, TypeHandle::of(&SHADOW));
        assert_eq!(wireless.name(), TypeHandle::of(&SHADOW).name());
    }

    #[test]
    fn test_ancestry() {
        let ip4 = TypeHandle::of(&builtin::IP4_CONFIG);
        let names: Vec<_> = ip4.ancestry().map(TypeHandle::name).collect();
        assert_eq!(names, ["CRSettingIP4Config", "CRSettingIPConfig", "CRSetting"]);

        assert!(ip4.is_a(TypeHandle::of(&builtin::IP_CONFIG)));
        assert!(ip4.is_a(TypeHandle::of(&builtin::SETTING)));
        assert!(!ip4.is_a(TypeHandle::of(&builtin::IP6_CONFIG)));
    }

    #[test]
    fn test_cyclic_chain_is_bounded() {
        let handle = TypeHandle::of(&LOOPING_A);
        assert_eq!(handle.ancestry().count(), MAX_TYPE_DEPTH);
        assert!(!handle.is_a(TypeHandle::of(&builtin::SETTING)));
    }
}
