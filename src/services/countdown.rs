/// Outcome of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// The clock is stopped or has already expired.
    Idle,
    Remaining(u64),
    Expired,
}

/// Single countdown from a total number of seconds to zero.
///
/// The clock is driven externally: the owner calls [`Countdown::tick`] once per
/// wall-clock second. Expiry is reported exactly once per `start`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Countdown {
    remaining_seconds: u64,
    running: bool,
}

impl Countdown {
    pub(crate) fn start(&mut self, total_seconds: u64) -> Tick {
        self.remaining_seconds = total_seconds;
        if total_seconds == 0 {
            self.running = false;
            return Tick::Expired;
        }

        self.running = true;
        Tick::Remaining(total_seconds)
    }

    pub(crate) fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.running = false;
            return Tick::Expired;
        }

        Tick::Remaining(self.remaining_seconds)
    }

    /// Freezes the remaining time. Returns whether the clock was running.
    pub(crate) fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }
}
