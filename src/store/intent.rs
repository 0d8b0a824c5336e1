/// Input to a [`Reducer`](super::Reducer).
///
/// Intents come from two places: the caller (retry, set, execute) and the
/// adapter's own driver task (request settled, timer fired).
pub trait Intent: Send + 'static {}
