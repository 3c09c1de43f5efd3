//! Cloneable callbacks used for lifecycle hooks.

use std::fmt;
use std::sync::Arc;

use crate::app::InstanceId;

/// A cloneable, thread-safe callback.
///
/// `Callback` wraps a closure in an `Arc`, so a definition holding one can be
/// cloned and shared between threads along with the registry.
///
/// ```
/// use sprig_components::Callback;
///
/// let double = Callback::new(|n: i64| n * 2);
/// assert_eq!(double.call(21), 42);
/// ```
pub struct Callback<Args, Ret = ()> {
	inner: Arc<dyn Fn(Args) -> Ret + Send + Sync + 'static>,
}

impl<Args, Ret> Callback<Args, Ret> {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(Args) -> Ret + Send + Sync + 'static,
	{
		Self { inner: Arc::new(f) }
	}

	pub fn call(&self, args: Args) -> Ret {
		(self.inner)(args)
	}
}

impl<Args, Ret> Clone for Callback<Args, Ret> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<Args, Ret> fmt::Debug for Callback<Args, Ret> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callback").finish_non_exhaustive()
	}
}

impl<Args, Ret, F> From<F> for Callback<Args, Ret>
where
	F: Fn(Args) -> Ret + Send + Sync + 'static,
{
	fn from(f: F) -> Self {
		Self::new(f)
	}
}

/// Passed to `on_mounted` and `on_unmounted` hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
	pub instance: InstanceId,
	pub component: String,
}

/// Hook type stored on component definitions.
pub type LifecycleHook = Callback<LifecycleEvent>;
