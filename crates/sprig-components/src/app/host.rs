//! Mount targets.

use std::collections::BTreeMap;

use super::InstanceId;

/// Named places root components can be mounted into.
///
/// ```
/// use sprig_components::MountHost;
///
/// let host = MountHost::new().with_target("app").with_target("sidebar");
/// assert!(host.has_target("app"));
/// assert_eq!(host.occupant("app"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MountHost {
	targets: BTreeMap<String, Option<InstanceId>>,
}

impl MountHost {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_target(mut self, name: impl Into<String>) -> Self {
		self.add_target(name);
		self
	}

	/// Adds an empty target. An existing target keeps its occupant.
	pub fn add_target(&mut self, name: impl Into<String>) {
		self.targets.entry(name.into()).or_insert(None);
	}

	pub fn has_target(&self, name: &str) -> bool {
		self.targets.contains_key(name)
	}

	/// The root mounted at `name`, if any.
	pub fn occupant(&self, name: &str) -> Option<InstanceId> {
		self.targets.get(name).copied().flatten()
	}

	pub fn targets(&self) -> impl Iterator<Item = &str> {
		self.targets.keys().map(String::as_str)
	}

	pub(crate) fn occupy(&mut self, name: &str, instance: InstanceId) {
		if let Some(slot) = self.targets.get_mut(name) {
			*slot = Some(instance);
		}
	}

	pub(crate) fn release(&mut self, name: &str) {
		if let Some(slot) = self.targets.get_mut(name) {
			*slot = None;
		}
	}
}
