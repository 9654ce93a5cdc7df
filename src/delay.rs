//! Busy-wait delays from a free-running hardware counter.

use embedded_hal::delay::DelayNs;

/// [`DelayNs`] implementation over a free-running, wrapping counter such as
/// the Cortex-M DWT cycle counter.
///
/// The wake-up sequence needs microsecond-accurate waits, which HAL tick
/// timers often cannot provide. This adapter busy-waits on any 32-bit
/// counter that increments at a known rate. Elapsed time is measured with
/// wrapping difference arithmetic, so a counter wrap mid-wait never
/// shortens the wait; waits longer than the counter period are split into
/// chunks internally.
///
/// The counter must already be running when the closure is handed over.
/// Starting it is the host's job and must happen exactly once.
///
/// ```ignore
/// // DWT cycle counter on a Cortex-M part:
/// let mut delay = CounterDelay::new(clocks.sysclk().to_MHz(), || DWT::cycle_count());
/// ```
pub struct CounterDelay<F> {
    now: F,
    ticks_per_us: u32,
}

impl<F: FnMut() -> u32> CounterDelay<F> {
    /// Create a delay provider from a counter read-out.
    ///
    /// `ticks_per_us` is the counter frequency in MHz, e.g. the core clock
    /// in MHz for a cycle counter.
    pub fn new(ticks_per_us: u32, now: F) -> Self {
        Self { now, ticks_per_us }
    }

    fn wait_ticks(&mut self, mut ticks: u64) {
        // Chunks stay below half the counter range so the wrapping
        // comparison is unambiguous.
        const CHUNK: u64 = (u32::MAX / 2) as u64;
        while ticks > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let step = ticks.min(CHUNK) as u32;
            let start = (self.now)();
            while (self.now)().wrapping_sub(start) < step {
                core::hint::spin_loop();
            }
            ticks -= u64::from(step);
        }
    }
}

impl<F: FnMut() -> u32> DelayNs for CounterDelay<F> {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = (u64::from(ns) * u64::from(self.ticks_per_us)).div_ceil(1000);
        self.wait_ticks(ticks);
    }
}
