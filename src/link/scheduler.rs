/// Decide whether a route request is due.
///
/// Returns the fire decision and the new last-request tick. Tick arithmetic is
/// modular, so a `u32` millisecond counter may wrap between calls.
pub fn should_request(now_ms: u32, last_ms: u32, interval_ms: u32, connected: bool) -> (bool, u32) {
    if connected && now_ms.wrapping_sub(last_ms) > interval_ms {
        (true, now_ms)
    } else {
        (false, last_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestScheduler {
    last_request_ms: u32,
}

impl RequestScheduler {
    pub fn new(last_request_ms: u32) -> Self {
        Self { last_request_ms }
    }

    /// Bias the last-request tick so the first request goes out `warmup_ms`
    /// after `now_ms`. Warm-up longer than the interval is clamped to it.
    pub fn with_warmup(now_ms: u32, interval_ms: u32, warmup_ms: u32) -> Self {
        let warmup_ms = warmup_ms.min(interval_ms);
        Self::new(now_ms.wrapping_add(warmup_ms).wrapping_sub(interval_ms))
    }

    pub fn last_request_ms(&self) -> u32 {
        self.last_request_ms
    }

    pub fn poll(&mut self, now_ms: u32, interval_ms: u32, connected: bool) -> bool {
        let (fire, last) = should_request(now_ms, self.last_request_ms, interval_ms, connected);
        self.last_request_ms = last;
        fire
    }
}
