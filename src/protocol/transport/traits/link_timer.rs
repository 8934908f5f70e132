//! Asynchronous clock abstraction driving the egress tick in the runner.
use embassy_time::Instant;

/// Monotonic clock with deadline-based waits.
pub trait LinkTimer {
    /// Current instant on the timer's monotonic clock.
    fn now(&self) -> Instant;
    /// Asynchronously wait until `deadline`; returns immediately when it is past.
    fn delay_until<'a>(
        &'a mut self,
        deadline: Instant,
    ) -> impl core::future::Future<Output = ()> + 'a;
}
