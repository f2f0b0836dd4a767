use std::time::Duration;

/// Computes the reconnect delay for a given attempt number.
///
/// Bounded exponential: `min(base * 2^attempt, ceiling)`, with `attempt`
/// starting at 1 after the first failure. Unbounded growth would make the
/// client appear permanently dead; no growth would hammer a service that is
/// still recovering.
pub fn reconnect_delay(attempt: u32, base: Duration, ceiling: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.checked_mul(factor).unwrap_or(ceiling).min(ceiling)
}
