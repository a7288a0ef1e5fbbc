/// ResourceMapping - name-indexed resources for bulk binding
///
/// `bind_resources` on a pipeline or binding object walks its variables and
/// looks each array element up here by (name, element).

use crate::resource::DeviceObject;
use rustc_hash::FxHashMap;

/// Map from (variable name, array element) to a device object
#[derive(Debug, Clone, Default)]
pub struct ResourceMapping {
    entries: FxHashMap<String, FxHashMap<u32, DeviceObject>>,
}

impl ResourceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` (element 0) to `object`, replacing any previous entry
    pub fn add_resource(&mut self, name: &str, object: impl Into<DeviceObject>) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .insert(0, object.into());
    }

    /// Map elements `first_element..` of `name` to `objects`
    pub fn add_resource_array(&mut self, name: &str, first_element: u32, objects: &[DeviceObject]) {
        let elements = self.entries.entry(name.to_string()).or_default();
        for (i, object) in objects.iter().enumerate() {
            elements.insert(first_element + i as u32, object.clone());
        }
    }

    /// Remove one element; the name disappears with its last element
    pub fn remove_resource(&mut self, name: &str, element: u32) -> Option<DeviceObject> {
        let elements = self.entries.get_mut(name)?;
        let removed = elements.remove(&element);
        if elements.is_empty() {
            self.entries.remove(name);
        }
        removed
    }

    pub fn get_resource(&self, name: &str, element: u32) -> Option<&DeviceObject> {
        self.entries.get(name)?.get(&element)
    }

    /// Number of mapped elements
    pub fn len(&self) -> usize {
        self.entries.values().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_mapping_tests.rs"]
mod tests;
