use std::fmt::Debug;

/// One-shot finalizer: runs its handler exactly once when the guard is
/// dropped, unless disarmed first. Backs `Observable::finally`.
pub struct DropGuard {
	handler: Option<Box<dyn FnOnce() + Send>>,
}

impl DropGuard {
	pub fn new(handler: impl FnOnce() + Send + 'static) -> Self {
		DropGuard {
			handler: Some(Box::new(handler)),
		}
	}

	/// Consumes the guard without firing the handler.
	pub fn disarm(mut self) {
		self.handler = None;
	}
}

impl Drop for DropGuard {
	fn drop(&mut self) {
		if let Some(handler) = self.handler.take() {
			handler()
		}
	}
}

impl Debug for DropGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DropGuard")
			.field("armed", &self.handler.is_some())
			.finish()
	}
}
