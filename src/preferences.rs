//! Integer user preferences, including the switch that turns tooltips on and off.

#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectResource;
use bevy_ecs::resource::Resource;
use bevy_platform::collections::HashMap;

/// The [`Preferences`] key that enables tooltips when set to a positive value.
pub const TOOLTIPS_KEY: &str = "Tooltips";

/// A [`Resource`] that stores integer user preferences by key.
///
/// A missing key reads as 0.
#[derive(Resource, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Resource)
)]
pub struct Preferences {
    values: HashMap<String, i32>,
}

impl Preferences {
    /// Read the value stored for `key`, or 0 if there is none.
    pub fn get_int(&self, key: &str) -> i32 {
        self.values.get(key).copied().unwrap_or_default()
    }

    /// Store `value` for `key`.
    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.values.insert(key.into(), value);
    }

    /// Whether a value is stored for `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove the value stored for `key`.
    pub fn delete_key(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Whether the user has tooltips turned on.
    pub fn tooltips_enabled(&self) -> bool {
        self.get_int(TOOLTIPS_KEY) > 0
    }

    /// Turn tooltips on or off.
    pub fn set_tooltips_enabled(&mut self, enabled: bool) {
        self.set_int(TOOLTIPS_KEY, i32::from(enabled));
    }
}
