use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::ExecutionContext;
use crate::observable::Observable;
use crate::subscription::Subscription;

/// An [`Observable`] with a current value. Every write re-emits, equal or
/// not, and subscribing replays the current value synchronously before any
/// future emission.
///
/// The lock around the value only protects the field itself; a write and
/// its emission are not atomic with respect to concurrent writers. Callers
/// that need a total write order synchronize externally.
pub struct Property<T> {
	value: Arc<RwLock<T>>,
	stream: Observable<T>,
}

impl<T> Clone for Property<T> {
	fn clone(&self) -> Self {
		Self {
			value: self.value.clone(),
			stream: self.stream.clone(),
		}
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Property<T>
where
	T: Clone + Send + 'static,
{
	pub fn new(value: T) -> Self {
		Property {
			value: Arc::new(RwLock::new(value)),
			stream: Observable::new(),
		}
	}

	#[inline]
	pub fn get(&self) -> T {
		self.value.read().clone()
	}

	/// Assigns and emits. No deduplication: setting the current value
	/// again still reaches every subscriber.
	pub fn set(&self, value: T) {
		*self.value.write() = value.clone();
		self.stream.emit(value);
	}

	/// Assigns and emits, returning the previous value.
	pub fn replace(&self, value: T) -> T {
		let old = {
			let mut current = self.value.write();
			std::mem::replace(&mut *current, value.clone())
		};
		self.stream.emit(value);
		old
	}

	/// Mutates the value in place, then emits the result.
	pub fn update(&self, func: impl FnOnce(&mut T)) {
		let next = {
			let mut current = self.value.write();
			func(&mut current);
			current.clone()
		};
		self.stream.emit(next);
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle,
	{
		self.update(T::toggle)
	}

	/// Registers `handler` like [`Observable::subscribe`], then invokes it
	/// once with the current value before returning. A writer racing the
	/// registration may be delivered before or after that replay call.
	///
	/// The replay runs with the value lock released, so the handler may
	/// write back into this property.
	pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		let handler = Arc::new(handler);
		let subscription = self.stream.subscribe({
			let handler = handler.clone();
			move |value: &T| (*handler)(value)
		});
		let current = self.value.read().clone();
		(*handler)(&current);
		subscription
	}

	/// [`Observable::subscribe_scoped`] plus the replay call.
	pub fn subscribe_scoped<R>(
		&self,
		retainer: &Arc<R>,
		handler: impl Fn(&T) + Send + Sync + 'static,
	) -> Subscription
	where
		R: Send + Sync + 'static,
	{
		let handler = Arc::new(handler);
		let subscription = self.stream.subscribe_scoped(retainer, {
			let handler = handler.clone();
			move |value: &T| (*handler)(value)
		});
		let current = self.value.read().clone();
		(*handler)(&current);
		subscription
	}

	/// [`Observable::subscribe_in`] plus the replay call. The replay runs
	/// inline on the subscribing thread, never through `context`.
	pub fn subscribe_in(
		&self,
		context: Arc<dyn ExecutionContext>,
		handler: impl Fn(&T) + Send + Sync + 'static,
	) -> Subscription {
		let handler = Arc::new(handler);
		let subscription = self.stream.subscribe_in(context, {
			let handler = handler.clone();
			move |value: &T| (*handler)(value)
		});
		let current = self.value.read().clone();
		(*handler)(&current);
		subscription
	}

	#[inline]
	pub fn observable(&self) -> &Observable<T> {
		&self.stream
	}
}

impl<T> Default for Property<T>
where
	T: Default + Clone + Send + 'static,
{
	fn default() -> Self {
		Property::new(Default::default())
	}
}

impl<T> Deref for Property<T> {
	type Target = Observable<T>;

	fn deref(&self) -> &Self::Target {
		&self.stream
	}
}

impl<T> From<Property<T>> for Observable<T> {
	fn from(property: Property<T>) -> Self {
		property.stream
	}
}

impl<T> Debug for Property<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.value.read().fmt(f)
	}
}
