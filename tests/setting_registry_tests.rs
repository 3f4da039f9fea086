//! Integration tests for the setting priority registry

use libnetctl_meta::setting::types::builtin;
use libnetctl_meta::setting::{
    base_type_priority, compare_priority, is_base_type, iterate_by_priority, lookup_by_meta_type,
    lookup_by_name, lookup_by_type_handle, order_for_secrets, SettingPriority, TypeHandle,
    TypeInfo, META_SETTING_TYPE_NUM, SETTING_INFOS,
};
use libnetctl_meta::{MetaError, Setting, Setting8021x};
use std::cmp::Ordering;
use std::collections::HashSet;

static VENDOR_ETHERNET: TypeInfo = TypeInfo::derived("VendorEthernet", &builtin::WIRED);

#[test]
fn test_every_name_round_trips() {
    for entry in SETTING_INFOS.iter() {
        let found = lookup_by_name(entry.name).unwrap();
        assert!(std::ptr::eq(found, entry), "lookup of {} returned {}", entry.name, found.name);
        assert!(std::ptr::eq(lookup_by_meta_type(entry.meta_type), entry));
    }
}

#[test]
fn test_every_type_handle_round_trips() {
    for entry in SETTING_INFOS.iter() {
        let found = lookup_by_type_handle(entry.type_handle).unwrap();
        assert_eq!(found.name, entry.name);
    }
}

#[test]
fn test_names_and_handles_are_unique() {
    let names: HashSet<_> = SETTING_INFOS.iter().map(|e| e.name).collect();
    let handles: HashSet<_> = SETTING_INFOS.iter().map(|e| e.type_handle).collect();
    assert_eq!(names.len(), META_SETTING_TYPE_NUM);
    assert_eq!(handles.len(), META_SETTING_TYPE_NUM);
}

#[test]
fn test_priority_iteration_is_complete_and_ordered() {
    let ordered: Vec<_> = iterate_by_priority().collect();
    assert_eq!(ordered.len(), META_SETTING_TYPE_NUM);

    for pair in ordered.windows(2) {
        assert_eq!(
            compare_priority(pair[0], pair[1]),
            Ordering::Less,
            "{} should come before {}",
            pair[0].name,
            pair[1].name
        );
    }

    assert_eq!(ordered.first().unwrap().name, "connection");
    assert_eq!(ordered.last().unwrap().priority, SettingPriority::User);
}

#[test]
fn test_no_entry_has_invalid_priority() {
    for entry in SETTING_INFOS.iter() {
        assert_ne!(entry.priority, SettingPriority::Invalid, "{}", entry.name);

        let priority = base_type_priority(entry, entry.type_handle);
        assert_ne!(priority, SettingPriority::Invalid);
        if entry.is_base_type {
            assert_eq!(priority, SettingPriority::HwBase);
        } else {
            assert_eq!(priority, SettingPriority::HwNonBase);
        }
    }
}

#[test]
fn test_base_type_priority_requires_exact_handle() {
    let wired = lookup_by_name("802-3-ethernet").unwrap();
    assert_eq!(
        base_type_priority(wired, TypeHandle::of(&builtin::WIRED)),
        SettingPriority::HwBase
    );
    assert_eq!(
        base_type_priority(wired, TypeHandle::of(&VENDOR_ETHERNET)),
        SettingPriority::HwNonBase
    );
}

#[test]
fn test_known_priorities() {
    let expect = [
        ("connection", SettingPriority::Connection),
        ("802-11-wireless", SettingPriority::HwBase),
        ("bluetooth", SettingPriority::HwNonBase),
        ("802-1x", SettingPriority::HwAux),
        ("802-11-wireless-security", SettingPriority::HwAux),
        ("pppoe", SettingPriority::Aux),
        ("ipv4", SettingPriority::Ip),
        ("ipv6", SettingPriority::Ip),
        ("user", SettingPriority::User),
    ];
    for (name, priority) in expect {
        assert_eq!(lookup_by_name(name).unwrap().priority, priority, "{}", name);
    }

    assert!(is_base_type("pppoe"));
    assert!(is_base_type("vpn"));
    assert!(!is_base_type("bluetooth"));
    assert!(!is_base_type("ipv4"));
    assert!(!is_base_type("no-such-setting"));
}

#[test]
fn test_unknown_lookups() {
    assert!(lookup_by_name("").is_none());
    assert!(lookup_by_name("802-11-WIRELESS").is_none());
    assert!(lookup_by_type_handle(TypeHandle::of(&builtin::IP_CONFIG)).is_none());
    assert!(lookup_by_type_handle(TypeHandle::of(&builtin::SETTING)).is_none());
}

#[test]
fn test_derived_type_resolves_to_ancestor() {
    let entry = lookup_by_type_handle(TypeHandle::of(&VENDOR_ETHERNET)).unwrap();
    assert_eq!(entry.name, "802-3-ethernet");
}

#[test]
fn test_setting_instance_lookup() {
    let setting = Setting8021x::new();
    assert_eq!(setting.type_handle().name(), "CRSetting8021x");
    let entry = libnetctl_meta::setting::lookup_by_setting(&setting).unwrap();
    assert_eq!(entry.name, "802-1x");
}

#[test]
fn test_order_for_secrets() {
    let order: Vec<_> = order_for_secrets(["ipv6", "802-11-wireless-security", "connection", "802-11-wireless", "ipv4"])
        .unwrap()
        .iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(
        order,
        ["connection", "802-11-wireless", "802-11-wireless-security", "ipv4", "ipv6"]
    );

    assert!(matches!(
        order_for_secrets(["connection", "bogus"]),
        Err(MetaError::NotFound(_))
    ));
}
