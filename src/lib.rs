pub mod macros;

mod context;
mod guard;
mod observable;
mod ops;
mod property;
mod subscription;

pub use context::{ContextFn, ExecutionContext, Inline, Task};
pub use guard::DropGuard;
pub use observable::Observable;
pub use property::{Property, Toggle};
pub use subscription::{Subscription, SubscriptionId};
