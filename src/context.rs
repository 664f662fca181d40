pub type Task = Box<dyn FnOnce() + Send>;

/// The queue or executor a subscription's handler is dispatched onto
/// instead of running inline on the emitting thread.
///
/// The library never spawns threads of its own; contexts come from the
/// host. Scheduling is fire-and-forget: `emit` does not wait for the
/// task to run.
pub trait ExecutionContext: Send + Sync + 'static {
	fn schedule(&self, task: Task);
}

/// Adapter for hosts that schedule with a plain function, e.g. a channel
/// sender or a thread-pool spawn.
pub struct ContextFn<F>(F);

impl<F> ContextFn<F>
where
	F: Fn(Task) + Send + Sync + 'static,
{
	pub fn new(schedule: F) -> Self {
		ContextFn(schedule)
	}
}

impl<F> ExecutionContext for ContextFn<F>
where
	F: Fn(Task) + Send + Sync + 'static,
{
	fn schedule(&self, task: Task) {
		(self.0)(task)
	}
}

/// Runs tasks immediately on the scheduling thread.
pub struct Inline;

impl ExecutionContext for Inline {
	fn schedule(&self, task: Task) {
		task()
	}
}
