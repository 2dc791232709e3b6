//! Clock capability.

/// Clock with a monotonic nanosecond source and a wall-clock millisecond source.
pub trait SystemNanoClock: Send + Sync {
    /// Monotonic nanoseconds, only meaningful as differences.
    fn nanos(&self) -> u64;

    /// Milliseconds since the Unix epoch.
    fn millis(&self) -> u64;
}
