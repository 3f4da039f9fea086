//! Setting type registry
//!
//! One entry per registered setting type, kept sorted by the ASCII order of
//! the setting name. The entry index equals the [`MetaSettingType`] ordinal.
//! A second static array lists the ordinals in priority order (ties broken by
//! name) for secrets requests and profile validation.

use super::priority::SettingPriority;
use super::types::{builtin, TypeHandle};
use super::Setting;
use crate::error::{MetaError, MetaResult};
use serde::Serialize;
use std::cmp::Ordering;

/// Ordinal of a registered setting type, in name order
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MetaSettingType {
    SixLowpan,
    OlpcMesh,
    Wireless,
    WirelessSecurity,
    Ieee8021x,
    Wired,
    Adsl,
    Bluetooth,
    Bond,
    BondPort,
    Bridge,
    BridgePort,
    Cdma,
    Connection,
    Dcb,
    Dummy,
    Ethtool,
    Generic,
    Gsm,
    Hostname,
    Infiniband,
    IpTunnel,
    Ip4Config,
    Ip6Config,
    Link,
    Loopback,
    Macsec,
    Macvlan,
    Match,
    OvsBridge,
    OvsDpdk,
    OvsExternalIds,
    OvsInterface,
    OvsOtherConfig,
    OvsPatch,
    OvsPort,
    Ppp,
    Pppoe,
    Proxy,
    Serial,
    Sriov,
    Tc,
    Team,
    TeamPort,
    Tun,
    User,
    Veth,
    Vlan,
    Vpn,
    Vrf,
    Vxlan,
    WifiP2p,
    Wimax,
    Wireguard,
    Wpan,
}

/// Number of registered setting types
pub const META_SETTING_TYPE_NUM: usize = MetaSettingType::Wpan as usize + 1;

impl MetaSettingType {
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Registry entry for this type
    pub fn entry(self) -> &'static SettingTypeEntry {
        &SETTING_INFOS[self as usize]
    }
}

/// Registry entry describing one setting type
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingTypeEntry {
    /// Setting name, e.g. "802-11-wireless"
    pub name: &'static str,
    /// Implementation type
    pub type_handle: TypeHandle,
    pub meta_type: MetaSettingType,
    pub priority: SettingPriority,
    /// Whether the setting can be a profile's primary type
    pub is_base_type: bool,
}

impl SettingTypeEntry {
    /// The handle that makes this entry a base type, if it is one
    pub fn base_type(&self) -> Option<TypeHandle> {
        self.is_base_type.then_some(self.type_handle)
    }
}

macro_rules! setting_info {
    ($meta:ident, $name:literal, $info:ident, $priority:ident) => {
        setting_info!($meta, $name, $info, $priority, matches!(SettingPriority::$priority, SettingPriority::HwBase))
    };
    ($meta:ident, $name:literal, $info:ident, $priority:ident, $base:expr) => {
        SettingTypeEntry {
            name: $name,
            type_handle: TypeHandle::of(&builtin::$info),
            meta_type: MetaSettingType::$meta,
            priority: SettingPriority::$priority,
            is_base_type: $base,
        }
    };
}

/// All registered setting types, sorted by name
pub static SETTING_INFOS: [SettingTypeEntry; META_SETTING_TYPE_NUM] = [
    setting_info!(SixLowpan, "6lowpan", SIX_LOWPAN, HwBase),
    setting_info!(OlpcMesh, "802-11-olpc-mesh", OLPC_MESH, HwBase),
    setting_info!(Wireless, "802-11-wireless", WIRELESS, HwBase),
    setting_info!(WirelessSecurity, "802-11-wireless-security", WIRELESS_SECURITY, HwAux),
    setting_info!(Ieee8021x, "802-1x", IEEE_8021X, HwAux),
    setting_info!(Wired, "802-3-ethernet", WIRED, HwBase),
    setting_info!(Adsl, "adsl", ADSL, HwBase),
    setting_info!(Bluetooth, "bluetooth", BLUETOOTH, HwNonBase),
    setting_info!(Bond, "bond", BOND, HwBase),
    setting_info!(BondPort, "bond-port", BOND_PORT, Aux),
    setting_info!(Bridge, "bridge", BRIDGE, HwBase),
    setting_info!(BridgePort, "bridge-port", BRIDGE_PORT, Aux),
    setting_info!(Cdma, "cdma", CDMA, HwBase),
    setting_info!(Connection, "connection", CONNECTION, Connection),
    setting_info!(Dcb, "dcb", DCB, HwAux),
    setting_info!(Dummy, "dummy", DUMMY, HwBase),
    setting_info!(Ethtool, "ethtool", ETHTOOL, Aux),
    setting_info!(Generic, "generic", GENERIC, HwBase),
    setting_info!(Gsm, "gsm", GSM, HwBase),
    setting_info!(Hostname, "hostname", HOSTNAME, Ip),
    setting_info!(Infiniband, "infiniband", INFINIBAND, HwBase),
    setting_info!(IpTunnel, "ip-tunnel", IP_TUNNEL, HwBase),
    setting_info!(Ip4Config, "ipv4", IP4_CONFIG, Ip),
    setting_info!(Ip6Config, "ipv6", IP6_CONFIG, Ip),
    setting_info!(Link, "link", LINK, Aux),
    setting_info!(Loopback, "loopback", LOOPBACK, HwBase),
    setting_info!(Macsec, "macsec", MACSEC, HwBase),
    setting_info!(Macvlan, "macvlan", MACVLAN, HwBase),
    setting_info!(Match, "match", MATCH, Aux),
    setting_info!(OvsBridge, "ovs-bridge", OVS_BRIDGE, HwBase),
    setting_info!(OvsDpdk, "ovs-dpdk", OVS_DPDK, Aux),
    setting_info!(OvsExternalIds, "ovs-external-ids", OVS_EXTERNAL_IDS, Aux),
    setting_info!(OvsInterface, "ovs-interface", OVS_INTERFACE, HwBase),
    setting_info!(OvsOtherConfig, "ovs-other-config", OVS_OTHER_CONFIG, Aux),
    setting_info!(OvsPatch, "ovs-patch", OVS_PATCH, HwBase),
    setting_info!(OvsPort, "ovs-port", OVS_PORT, HwBase),
    setting_info!(Ppp, "ppp", PPP, Aux),
    // PPPoE is a base type but its secrets come after 802.1x and Wi-Fi security
    setting_info!(Pppoe, "pppoe", PPPOE, Aux, true),
    setting_info!(Proxy, "proxy", PROXY, Ip),
    setting_info!(Serial, "serial", SERIAL, HwAux),
    setting_info!(Sriov, "sriov", SRIOV, HwAux),
    setting_info!(Tc, "tc", TC_CONFIG, Ip),
    setting_info!(Team, "team", TEAM, HwBase),
    setting_info!(TeamPort, "team-port", TEAM_PORT, Aux),
    setting_info!(Tun, "tun", TUN, HwBase),
    setting_info!(User, "user", USER, User),
    setting_info!(Veth, "veth", VETH, HwBase),
    setting_info!(Vlan, "vlan", VLAN, HwBase),
    setting_info!(Vpn, "vpn", VPN, HwBase),
    setting_info!(Vrf, "vrf", VRF, HwBase),
    setting_info!(Vxlan, "vxlan", VXLAN, HwBase),
    setting_info!(WifiP2p, "wifi-p2p", WIFI_P2P, HwBase),
    setting_info!(Wimax, "wimax", WIMAX, HwBase),
    setting_info!(Wireguard, "wireguard", WIREGUARD, HwBase),
    setting_info!(Wpan, "wpan", WPAN, HwBase),
];

/// Setting types ordered by priority, then by name
pub static SETTING_TYPES_BY_PRIORITY: [MetaSettingType; META_SETTING_TYPE_NUM] = {
    use MetaSettingType::*;
    [
        // connection
        Connection,
        // hw-base
        SixLowpan,
        OlpcMesh,
        Wireless,
        Wired,
        Adsl,
        Bond,
        Bridge,
        Cdma,
        Dummy,
        Generic,
        Gsm,
        Infiniband,
        IpTunnel,
        Loopback,
        Macsec,
        Macvlan,
        OvsBridge,
        OvsInterface,
        OvsPatch,
        OvsPort,
        Team,
        Tun,
        Veth,
        Vlan,
        Vpn,
        Vrf,
        Vxlan,
        WifiP2p,
        Wimax,
        Wireguard,
        Wpan,
        // hw-non-base
        Bluetooth,
        // hw-aux
        WirelessSecurity,
        Ieee8021x,
        Dcb,
        Serial,
        Sriov,
        // aux
        BondPort,
        BridgePort,
        Ethtool,
        Link,
        Match,
        OvsDpdk,
        OvsExternalIds,
        OvsOtherConfig,
        Ppp,
        Pppoe,
        TeamPort,
        // ip
        Hostname,
        Ip4Config,
        Ip6Config,
        Proxy,
        Tc,
        // user
        User,
    ]
};

/// Find a setting type by exact name
pub fn lookup_by_name(name: &str) -> Option<&'static SettingTypeEntry> {
    SETTING_INFOS
        .binary_search_by(|entry| entry.name.cmp(name))
        .ok()
        .map(|idx| &SETTING_INFOS[idx])
}

/// Entry for a known ordinal
pub fn lookup_by_meta_type(meta_type: MetaSettingType) -> &'static SettingTypeEntry {
    meta_type.entry()
}

/// Resolve an implementation type to its registry entry.
///
/// Types that are not registered themselves resolve to their nearest
/// registered ancestor.
pub fn lookup_by_type_handle(handle: TypeHandle) -> Option<&'static SettingTypeEntry> {
    handle
        .ancestry()
        .find_map(|ancestor| SETTING_INFOS.iter().find(|entry| entry.type_handle == ancestor))
}

/// Registry entry for a setting instance
pub fn lookup_by_setting(setting: &dyn Setting) -> Option<&'static SettingTypeEntry> {
    lookup_by_type_handle(setting.type_handle())
}

/// All registered setting types in priority order
pub fn iterate_by_priority() -> impl Iterator<Item = &'static SettingTypeEntry> + Clone {
    SETTING_TYPES_BY_PRIORITY.iter().map(|meta_type| meta_type.entry())
}

/// `HwBase` when `handle` is exactly the entry's base type, `HwNonBase` otherwise
pub fn base_type_priority(entry: &SettingTypeEntry, handle: TypeHandle) -> SettingPriority {
    match entry.base_type() {
        Some(base) if base == handle => SettingPriority::HwBase,
        _ => SettingPriority::HwNonBase,
    }
}

/// Order two entries by priority band, then by name
pub fn compare_priority(a: &SettingTypeEntry, b: &SettingTypeEntry) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name))
}

/// Whether `name` is a registered setting that can be a profile's base type
pub fn is_base_type(name: &str) -> bool {
    lookup_by_name(name).is_some_and(|entry| entry.is_base_type)
}

/// Order setting names the way secrets are requested.
///
/// Fails on the first name that is not registered.
pub fn order_for_secrets<'a, I>(names: I) -> MetaResult<Vec<&'static SettingTypeEntry>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = names
        .into_iter()
        .map(|name| {
            lookup_by_name(name)
                .ok_or_else(|| MetaError::NotFound(format!("unknown setting '{}'", name)))
        })
        .collect::<MetaResult<Vec<_>>>()?;

    entries.sort_by(|a, b| compare_priority(a, b));
    entries.dedup_by_key(|entry| entry.meta_type);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::types::TypeInfo;

    static VENDOR_WIRELESS: TypeInfo = TypeInfo::derived("VendorWireless", &builtin::WIRELESS);
    static VENDOR_WIRELESS_EXT: TypeInfo = TypeInfo::derived("VendorWirelessExt", &VENDOR_WIRELESS);
    static ORPHAN: TypeInfo = TypeInfo::root("Orphan");

    #[test]
    fn test_ordinals_match_table_index() {
        for (idx, entry) in SETTING_INFOS.iter().enumerate() {
            assert_eq!(entry.meta_type.ordinal(), idx, "{}", entry.name);
        }
    }

    #[test]
    fn test_table_sorted_by_name() {
        for pair in SETTING_INFOS.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} >= {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn test_lookup_by_name_exact_match() {
        let entry = lookup_by_name("802-11-wireless").unwrap();
        assert_eq!(entry.meta_type, MetaSettingType::Wireless);
        assert_eq!(entry.priority, SettingPriority::HwBase);

        assert!(lookup_by_name("802-11-WIRELESS").is_none());
        assert!(lookup_by_name("802-11").is_none());
        assert!(lookup_by_name("").is_none());
    }

    #[test]
    fn test_lookup_by_type_handle_walks_parents() {
        let direct = lookup_by_type_handle(TypeHandle::of(&builtin::WIRELESS)).unwrap();
        assert_eq!(direct.name, "802-11-wireless");

        let derived = lookup_by_type_handle(TypeHandle::of(&VENDOR_WIRELESS_EXT)).unwrap();
        assert_eq!(derived.name, "802-11-wireless");

        assert!(lookup_by_type_handle(TypeHandle::of(&builtin::IP_CONFIG)).is_none());
        assert!(lookup_by_type_handle(TypeHandle::of(&builtin::SETTING)).is_none());
        assert!(lookup_by_type_handle(TypeHandle::of(&ORPHAN)).is_none());
    }

    #[test]
    fn test_priority_array_matches_derived_order() {
        let mut expected: Vec<_> = SETTING_INFOS.iter().collect();
        expected.sort_by(|a, b| compare_priority(a, b));
        let actual: Vec<_> = iterate_by_priority().collect();

        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert_eq!(a.name, e.name);
        }
    }

    #[test]
    fn test_base_type_priority() {
        let wireless = lookup_by_name("802-11-wireless").unwrap();
        let wireless_handle = TypeHandle::of(&builtin::WIRELESS);
        assert_eq!(base_type_priority(wireless, wireless_handle), SettingPriority::HwBase);
        assert_eq!(
            base_type_priority(wireless, TypeHandle::of(&VENDOR_WIRELESS)),
            SettingPriority::HwNonBase
        );

        let security = lookup_by_name("802-11-wireless-security").unwrap();
        assert_eq!(
            base_type_priority(security, security.type_handle),
            SettingPriority::HwNonBase
        );

        let pppoe = lookup_by_name("pppoe").unwrap();
        assert_eq!(base_type_priority(pppoe, pppoe.type_handle), SettingPriority::HwBase);
    }

    #[test]
    fn test_is_base_type() {
        assert!(is_base_type("802-3-ethernet"));
        assert!(is_base_type("vpn"));
        assert!(is_base_type("pppoe"));
        assert!(!is_base_type("bluetooth"));
        assert!(!is_base_type("ipv4"));
        assert!(!is_base_type("nonexistent"));
    }

    #[test]
    fn test_order_for_secrets() {
        let ordered = order_for_secrets(["ipv4", "802-1x", "connection", "802-3-ethernet", "ipv4"]).unwrap();
        let names: Vec<_> = ordered.iter().map(|e| e.name).collect();
        assert_eq!(names, ["connection", "802-3-ethernet", "802-1x", "ipv4"]);

        assert!(matches!(
            order_for_secrets(["connection", "bogus"]),
            Err(MetaError::NotFound(_))
        ));
    }
}
