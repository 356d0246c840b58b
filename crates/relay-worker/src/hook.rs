//! Pre-process hook run on every non-ignored event before it is published.

use futures::FutureExt as _;
use futures::future::BoxFuture;
use relay_types::RawEvent;

/// Inspect or rewrite an event before the dispatcher republishes it.
///
/// Returning `None` drops the event. Plain synchronous closures
/// `Fn(RawEvent) -> Option<RawEvent>` implement this trait directly;
/// implement it by hand for hooks that need to await.
pub trait PreProcessHook: Send + Sync {
    /// Return the event to publish, or `None` to drop it.
    fn process(&self, event: RawEvent) -> BoxFuture<'_, Option<RawEvent>>;
}

impl<F> PreProcessHook for F
where
    F: Fn(RawEvent) -> Option<RawEvent> + Send + Sync,
{
    fn process(&self, event: RawEvent) -> BoxFuture<'_, Option<RawEvent>> {
        futures::future::ready(self(event)).boxed()
    }
}
