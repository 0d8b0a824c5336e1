/// State published by a [`Store`](super::Store).
///
/// Snapshots are cloned out to readers, so keep them small.
pub trait HookState: Clone + Send + Sync + 'static {}
