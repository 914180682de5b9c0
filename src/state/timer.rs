use crate::state::error::EngineError;

/// What a scheduler tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale generation or stopped countdown; nothing changed.
    Ignored,
    /// One second elapsed.
    Ticked {
        /// Seconds left after the decrement.
        remaining: u32,
    },
    /// The countdown reached zero during this tick.
    Expired,
}

/// Single countdown driven by externally delivered one-second ticks.
///
/// Every start, pause, and reset bumps the generation; ticks scheduled under an older
/// generation are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
    configured: u32,
    pending_duration: Option<u32>,
    generation: u64,
    expired: bool,
}

impl Countdown {
    /// Stopped countdown showing the full duration.
    pub fn new(duration: u32) -> Self {
        let configured = duration.max(1);
        Self {
            remaining: configured,
            running: false,
            configured,
            pending_duration: None,
            generation: 0,
            expired: false,
        }
    }

    /// Countdown restored from persisted values.
    pub fn restore(remaining: u32, running: bool, configured: u32, generation: u64) -> Self {
        let mut countdown = Self::new(configured);
        countdown.remaining = remaining;
        countdown.generation = generation;
        countdown.running = running && remaining > 0;
        countdown.expired = remaining == 0;
        countdown
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether ticks currently decrement.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Duration restored by a reset.
    pub fn configured(&self) -> u32 {
        self.configured
    }

    /// Duration waiting for the next reset.
    pub fn pending_duration(&self) -> Option<u32> {
        self.pending_duration
    }

    /// Generation ticks must carry to be honoured.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the last run reached zero.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Start counting down, rewinding first when already at zero.
    ///
    /// Returns `false` when the countdown was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        if self.remaining == 0 {
            self.reset(None);
        }
        self.running = true;
        self.expired = false;
        self.generation += 1;
        true
    }

    /// Stop counting; returns `false` when already stopped.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.generation += 1;
        true
    }

    /// Start when stopped, pause when running.
    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stop and rewind to `duration`, a deferred duration, or the configured one.
    pub fn reset(&mut self, duration: Option<u32>) {
        if let Some(next) = duration.or(self.pending_duration.take()) {
            self.configured = next.max(1);
        }
        self.pending_duration = None;
        self.remaining = self.configured;
        self.running = false;
        self.expired = false;
        self.generation += 1;
    }

    /// Change the configured duration.
    ///
    /// While running the change waits for the next reset so the live countdown is not
    /// disturbed; otherwise the display rewinds to the new value.
    pub fn set_duration(&mut self, seconds: u32) -> Result<(), EngineError> {
        if seconds == 0 {
            return Err(EngineError::InvalidTransition(
                "timer duration must be positive".into(),
            ));
        }
        if self.running {
            self.pending_duration = Some(seconds);
        } else {
            self.reset(Some(seconds));
        }
        Ok(())
    }

    /// Apply one elapsed second scheduled under `generation`.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if !self.running || generation != self.generation {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            self.generation += 1;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked {
                remaining: self.remaining,
            }
        }
    }

    /// Remaining time as `MM:SS`, or `HH:MM:SS` from one hour.
    pub fn format_clock(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Format a number of seconds as `MM:SS`, or `HH:MM:SS` from one hour.
pub fn format_clock(total: u32) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(countdown: &mut Countdown) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..(countdown.configured() + 3) {
            outcomes.push(countdown.tick(countdown.generation()));
        }
        outcomes
    }

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::new(3);
        countdown.start();
        let outcomes = run_to_end(&mut countdown);

        let expiries = outcomes
            .iter()
            .filter(|outcome| **outcome == TickOutcome::Expired)
            .count();
        assert_eq!(expiries, 1);
        assert_eq!(outcomes[0], TickOutcome::Ticked { remaining: 2 });
        assert_eq!(outcomes[2], TickOutcome::Expired);
        assert!(outcomes[3..].iter().all(|o| *o == TickOutcome::Ignored));
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn start_at_zero_rewinds_first() {
        let mut countdown = Countdown::new(2);
        countdown.start();
        run_to_end(&mut countdown);
        assert_eq!(countdown.remaining(), 0);

        assert!(countdown.start());
        assert_eq!(countdown.remaining(), 2);
        assert!(countdown.is_running());
        assert!(!countdown.is_expired());
    }

    #[test]
    fn stale_ticks_are_ignored_after_pause_and_reset() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        let armed = countdown.generation();
        countdown.pause();
        assert_eq!(countdown.tick(armed), TickOutcome::Ignored);
        assert_eq!(countdown.remaining(), 10);

        countdown.start();
        let armed = countdown.generation();
        countdown.reset(None);
        countdown.start();
        assert_eq!(countdown.tick(armed), TickOutcome::Ignored);
        assert_eq!(countdown.remaining(), 10);
    }

    #[test]
    fn duration_change_is_deferred_while_running() {
        let mut countdown = Countdown::new(15);
        countdown.start();
        countdown.tick(countdown.generation());
        countdown.set_duration(30).unwrap();

        assert_eq!(countdown.remaining(), 14);
        assert_eq!(countdown.configured(), 15);
        assert_eq!(countdown.pending_duration(), Some(30));

        countdown.reset(None);
        assert_eq!(countdown.remaining(), 30);
        assert_eq!(countdown.configured(), 30);
        assert_eq!(countdown.pending_duration(), None);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut countdown = Countdown::new(5);
        assert!(countdown.set_duration(0).is_err());
        countdown.set_duration(8).unwrap();
        assert_eq!(countdown.remaining(), 8);
    }

    #[test]
    fn toggle_alternates() {
        let mut countdown = Countdown::new(5);
        countdown.toggle();
        assert!(countdown.is_running());
        countdown.toggle();
        assert!(!countdown.is_running());
    }

    #[test]
    fn clock_format() {
        assert_eq!(Countdown::restore(75, false, 90, 0).format_clock(), "01:15");
        assert_eq!(Countdown::restore(7200, false, 7200, 0).format_clock(), "02:00:00");
    }
}
