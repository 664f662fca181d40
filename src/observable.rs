use std::any::Any;
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::context::ExecutionContext;
use crate::guard::DropGuard;
use crate::subscription::{Retainer, SubscriberSet, Subscription, SubscriptionId};

/// A publisher of a typed value stream. Cheap to clone; every clone is a
/// handle to the same subscriber set.
pub struct Observable<T> {
	body: Arc<ObservableBody<T>>,
}

impl<T> Clone for Observable<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct ObservableBody<T> {
	inner: Mutex<ObservableInner<T>>,
}

struct ObservableInner<T> {
	subscribers: FxHashMap<SubscriptionId, Arc<SubscriberEntry<T>>>,
	guards: Vec<DropGuard>,
}

struct SubscriberEntry<T> {
	handler: Box<dyn Fn(&T) + Send + Sync>,
	context: Option<Arc<dyn ExecutionContext>>,
	retainer: Retainer,
}

impl<T> Observable<T>
where
	T: Clone + Send + 'static,
{
	pub fn new() -> Self {
		Observable {
			body: Arc::new(ObservableBody {
				inner: Mutex::new(ObservableInner {
					subscribers: FxHashMap::default(),
					guards: Vec::new(),
				}),
			}),
		}
	}

	/// Registers `handler` for every future emission. The subscription
	/// lives as long as the stream itself unless cancelled.
	pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		self.subscribe_raw(Retainer::Stream, None, Box::new(handler))
	}

	/// Registers `handler` with `retainer` governing its lifetime: once
	/// the retainer is dropped the subscription is treated as cancelled,
	/// and the dead entry is purged during the next `emit` pass.
	pub fn subscribe_scoped<R>(
		&self,
		retainer: &Arc<R>,
		handler: impl Fn(&T) + Send + Sync + 'static,
	) -> Subscription
	where
		R: Send + Sync + 'static,
	{
		let object: Arc<dyn Any + Send + Sync> = retainer.clone();
		self.subscribe_raw(
			Retainer::Scoped(Arc::downgrade(&object)),
			None,
			Box::new(handler),
		)
	}

	/// Registers `handler` for asynchronous delivery: every emission is
	/// scheduled onto `context` instead of running on the emitting thread.
	pub fn subscribe_in(
		&self,
		context: Arc<dyn ExecutionContext>,
		handler: impl Fn(&T) + Send + Sync + 'static,
	) -> Subscription {
		self.subscribe_raw(Retainer::Stream, Some(context), Box::new(handler))
	}

	pub(crate) fn subscribe_raw(
		&self,
		retainer: Retainer,
		context: Option<Arc<dyn ExecutionContext>>,
		handler: Box<dyn Fn(&T) + Send + Sync>,
	) -> Subscription {
		let id = SubscriptionId::new();
		let entry = Arc::new(SubscriberEntry {
			handler,
			context,
			retainer,
		});

		self.body.inner.lock().subscribers.insert(id, entry);
		tracing::trace!(subscription = ?id, "subscribe");

		Subscription::new(Arc::downgrade(&self.body) as Weak<dyn SubscriberSet>, id)
	}

	/// Idempotent removal; a no-op if the subscription was never attached
	/// here or is already gone.
	pub fn unsubscribe(&self, subscription: &Subscription) {
		self.body.unsubscribe(subscription.id());
	}

	/// Publishes `value` to every live subscriber.
	///
	/// The subscriber map is snapshotted under the lock (purging entries
	/// whose retainer died) and the lock is released before any handler
	/// runs, so handlers may freely call back into `subscribe`,
	/// `unsubscribe`, `emit` or `dispose` on this stream. Two consequences:
	/// a subscriber added during the delivery does not see the in-flight
	/// value, and one removed during the delivery may still see it.
	///
	/// Context-less subscribers run inline, one after another, on the
	/// calling thread. Contexted subscribers get a clone of the value
	/// scheduled onto their context; `emit` does not wait for them.
	pub fn emit(&self, value: T) {
		let live: SmallVec<[Arc<SubscriberEntry<T>>; 8]> = {
			let mut inner = self.body.inner.lock();
			inner.subscribers.retain(|_, entry| entry.retainer.is_alive());
			inner.subscribers.values().cloned().collect()
		};

		for entry in live {
			match &entry.context {
				Some(context) => {
					let value = value.clone();
					let entry = entry.clone();
					context.schedule(Box::new(move || (entry.handler)(&value)));
				}
				None => (entry.handler)(&value),
			}
		}
	}

	/// Detaches every subscriber at once. The stream stays usable and new
	/// subscribers can attach afterwards.
	pub fn dispose(&self) {
		let mut inner = self.body.inner.lock();
		let dropped = inner.subscribers.len();
		inner.subscribers.clear();
		tracing::trace!(dropped, "dispose");
	}

	pub fn subscriber_count(&self) -> usize {
		self.body.inner.lock().subscribers.len()
	}

	/// Builds a downstream pipeline atomically: `builder` receives a fresh
	/// stream to attach operators to, and only once it returns is a single
	/// forwarding subscription attached here — so no value can slip
	/// between the pipeline stages being wired up separately.
	pub fn compose<R>(&self, builder: impl FnOnce(&Observable<T>) -> R) -> (R, Subscription) {
		let inner = Observable::new();
		let result = builder(&inner);

		let subscription = self.subscribe({
			let inner = inner.clone();
			move |value: &T| inner.emit(value.clone())
		});

		(result, subscription)
	}

	/// Like [`Observable::compose`], with the forwarding subscription's
	/// lifetime bound to `retainer`.
	pub fn compose_scoped<R, O>(
		&self,
		retainer: &Arc<O>,
		builder: impl FnOnce(&Observable<T>) -> R,
	) -> (R, Subscription)
	where
		O: Send + Sync + 'static,
	{
		let inner = Observable::new();
		let result = builder(&inner);

		let subscription = self.subscribe_scoped(retainer, {
			let inner = inner.clone();
			move |value: &T| inner.emit(value.clone())
		});

		(result, subscription)
	}

	/// Attaches a one-shot finalizer that fires when the last handle to
	/// this stream (subscriber closures of downstream operators included)
	/// is released. Returns a clone of self for chaining.
	pub fn finally(&self, handler: impl FnOnce() + Send + 'static) -> Observable<T> {
		self.body.inner.lock().guards.push(DropGuard::new(handler));
		self.clone()
	}
}

impl<T> Default for Observable<T>
where
	T: Clone + Send + 'static,
{
	fn default() -> Self {
		Observable::new()
	}
}

impl<T> SubscriberSet for ObservableBody<T>
where
	T: 'static,
{
	fn unsubscribe(&self, id: SubscriptionId) {
		if self.inner.lock().subscribers.remove(&id).is_some() {
			tracing::trace!(subscription = ?id, "unsubscribe");
		}
	}

	fn contains(&self, id: SubscriptionId) -> bool {
		self.inner.lock().subscribers.contains_key(&id)
	}
}

impl<T> Debug for Observable<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observable")
			.field("subscribers", &self.body.inner.lock().subscribers.len())
			.finish()
	}
}
