//! Setting priority registry
//!
//! Maps every setting type to a priority band and supports lookup by name and
//! by implementation type. The tables are static and never change at runtime.

pub mod priority;
pub mod registry;
pub mod types;

pub use priority::SettingPriority;
pub use registry::{
    base_type_priority, compare_priority, is_base_type, iterate_by_priority, lookup_by_meta_type,
    lookup_by_name, lookup_by_setting, lookup_by_type_handle, order_for_secrets, MetaSettingType,
    SettingTypeEntry, META_SETTING_TYPE_NUM, SETTING_INFOS, SETTING_TYPES_BY_PRIORITY,
};
pub use types::{TypeHandle, TypeInfo, MAX_TYPE_DEPTH};

/// A concrete setting implementation
pub trait Setting {
    /// Implementation type of this instance
    fn type_handle(&self) -> TypeHandle;
}
