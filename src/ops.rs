use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::ExecutionContext;
use crate::observable::Observable;
use crate::subscription::Subscription;

/// Stream transformation operators.
///
/// Each operator creates a fresh downstream stream, subscribes to the
/// source and forwards into it. The forwarding closure holds a clone of
/// the downstream handle, so the downstream stays alive exactly as long
/// as the source keeps the forwarding subscription.
impl<T> Observable<T>
where
	T: Clone + Send + 'static,
{
	/// Forwards only the values for which `predicate` holds.
	pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Observable<T> {
		let next = Observable::new();

		self.subscribe({
			let next = next.clone();
			move |value: &T| {
				if predicate(value) {
					next.emit(value.clone())
				}
			}
		});

		next
	}

	/// Forwards `transform(value)` for every value.
	pub fn map<U>(&self, transform: impl Fn(&T) -> U + Send + Sync + 'static) -> Observable<U>
	where
		U: Clone + Send + 'static,
	{
		let next = Observable::new();

		self.subscribe({
			let next = next.clone();
			move |value: &T| next.emit(transform(value))
		});

		next
	}

	/// Forwards `transform(value)` when it yields `Some`; `None` produces
	/// no downstream emission at all.
	pub fn filter_map<U>(
		&self,
		transform: impl Fn(&T) -> Option<U> + Send + Sync + 'static,
	) -> Observable<U>
	where
		U: Clone + Send + 'static,
	{
		let next = Observable::new();

		self.subscribe({
			let next = next.clone();
			move |value: &T| {
				if let Some(mapped) = transform(value) {
					next.emit(mapped)
				}
			}
		});

		next
	}

	/// Folds the stream: on each upstream value the accumulator is updated
	/// via `combine` and the new accumulator is forwarded, starting with
	/// the very first value.
	pub fn reduce<A>(
		&self,
		initial: A,
		combine: impl Fn(&A, &T) -> A + Send + Sync + 'static,
	) -> Observable<A>
	where
		A: Clone + Send + 'static,
	{
		let next = Observable::new();
		let accumulator = Mutex::new(initial);

		self.subscribe({
			let next = next.clone();
			move |value: &T| {
				let mut accumulator = accumulator.lock();
				*accumulator = combine(&accumulator, value);
				next.emit(accumulator.clone());
			}
		});

		next
	}

	/// Attaches `handler` as a side effect and returns a clone of self,
	/// so a chain can continue on the same stream.
	pub fn for_each(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Observable<T> {
		self.subscribe(handler);
		self.clone()
	}

	/// Forwards every value by scheduling delivery on `context` instead
	/// of emitting on the caller's thread.
	pub fn observe_on(&self, context: Arc<dyn ExecutionContext>) -> Observable<T> {
		let next = Observable::new();

		self.subscribe_in(context, {
			let next = next.clone();
			move |value: &T| next.emit(value.clone())
		});

		next
	}

	/// Forwards values unchanged while `object` is alive; once it drops,
	/// the forwarding subscription is implicitly cancelled.
	pub fn retain<R>(&self, object: &Arc<R>) -> Observable<T>
	where
		R: Send + Sync + 'static,
	{
		let next = Observable::new();

		self.subscribe_scoped(object, {
			let next = next.clone();
			move |value: &T| next.emit(value.clone())
		});

		next
	}

	/// Forwards only the first value, then cancels its own upstream
	/// subscription. The value is fully delivered downstream before the
	/// cancellation happens.
	pub fn once(&self) -> Observable<T> {
		let next = Observable::new();
		let fired = Arc::new(AtomicBool::new(false));
		let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

		let subscription = self.subscribe({
			let next = next.clone();
			let fired = fired.clone();
			let slot = slot.clone();
			move |value: &T| {
				if fired.swap(true, Ordering::AcqRel) {
					return;
				}
				next.emit(value.clone());
				if let Some(subscription) = slot.lock().take() {
					subscription.cancel();
				}
			}
		});

		// An emit may race the registration phase: if the first value
		// already went through, the handler found the slot empty and the
		// cancellation falls to us here.
		let mut slot = slot.lock();
		if fired.load(Ordering::Acquire) {
			subscription.cancel();
		} else {
			*slot = Some(subscription);
		}

		next
	}
}
