use std::any::Any;
use std::fmt::Debug;
use std::sync::Weak;

use snowflake::ProcessUniqueId;

pub type SubscriptionId = ProcessUniqueId;

/// Type-erased view of a stream's subscriber map, so a [`Subscription`]
/// can detach itself without knowing the stream's value type.
pub(crate) trait SubscriberSet: Send + Sync {
	fn unsubscribe(&self, id: SubscriptionId);
	fn contains(&self, id: SubscriptionId) -> bool;
}

/// What bounds a subscription's lifetime. `Stream` means the subscription
/// lives as long as the stream body itself; `Scoped` ties it to an external
/// object, checked lazily at emit time without extending that object's life.
pub(crate) enum Retainer {
	Stream,
	Scoped(Weak<dyn Any + Send + Sync>),
}

impl Retainer {
	pub(crate) fn is_alive(&self) -> bool {
		match self {
			Retainer::Stream => true,
			Retainer::Scoped(object) => object.strong_count() > 0,
		}
	}
}

/// Handle for one registered callback.
///
/// Dropping the handle does nothing; delivery stops only through
/// [`Subscription::cancel`], `Observable::unsubscribe`, `dispose`, or the
/// retainer going away.
#[derive(Clone)]
pub struct Subscription {
	stream: Weak<dyn SubscriberSet>,
	id: SubscriptionId,
}

impl Subscription {
	pub(crate) fn new(stream: Weak<dyn SubscriberSet>, id: SubscriptionId) -> Self {
		Subscription { stream, id }
	}

	pub fn id(&self) -> SubscriptionId {
		self.id
	}

	/// Idempotent. A no-op when the stream is gone or the entry was
	/// already removed.
	pub fn cancel(&self) {
		if let Some(stream) = self.stream.upgrade() {
			stream.unsubscribe(self.id);
		}
	}

	pub fn is_attached(&self) -> bool {
		match self.stream.upgrade() {
			Some(stream) => stream.contains(self.id),
			None => false,
		}
	}
}

impl Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("attached", &self.is_attached())
			.finish()
	}
}
