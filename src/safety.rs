//! Consecutive-cycle limiter.
//!
//! Sits between the dry/wet decision and the actuator.  Every dry
//! iteration that actually runs the pump extends the streak; the first
//! non-dry reading resets it.  With a cap configured, the pump is held off
//! once the streak reaches it, which stops a stuck-dry probe (unplugged,
//! shorted, out of the soil) from emptying the reservoir.
//!
//! ## Lifecycle
//!
//! 1. Dry reading → [`CycleLimiter::permit`] → [`Permit::Run`] while under
//!    the cap.
//! 2. Cap reached → [`Permit::LockedOut`] once, then
//!    [`Permit::StillLockedOut`] until the soil reads wet.
//! 3. Wet reading → [`CycleLimiter::reset`] clears streak and lockout.
//!
//! A cap of `0` disables the limiter and every dry reading re-triggers.

use log::{error, info};

use crate::config::RunPolicy;

pub struct CycleLimiter {
    /// `0` = unlimited.
    max_cycles: u32,
    /// Pump runs since the last non-dry reading.
    streak: u32,
    locked_out: bool,
}

/// Outcome of asking the limiter for another run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    Run,
    /// Cap hit on this call; report it.
    LockedOut { cycles: u32 },
    /// Cap already reported; stay quiet.
    StillLockedOut,
}

impl CycleLimiter {
    pub fn new(policy: &RunPolicy) -> Self {
        Self {
            max_cycles: policy.max_consecutive_cycles,
            streak: 0,
            locked_out: false,
        }
    }

    /// Ask for one more pump run on a dry reading.
    pub fn permit(&mut self) -> Permit {
        if self.max_cycles != 0 && self.streak >= self.max_cycles {
            if self.locked_out {
                return Permit::StillLockedOut;
            }
            self.locked_out = true;
            error!(
                "CYCLE LIMIT: {} consecutive runs, pump held off",
                self.streak
            );
            return Permit::LockedOut {
                cycles: self.streak,
            };
        }
        self.streak = self.streak.saturating_add(1);
        Permit::Run
    }

    /// Non-dry reading: the soil took water, start counting afresh.
    pub fn reset(&mut self) {
        if self.locked_out {
            info!("CYCLE LIMIT CLEARED after wet reading");
        }
        self.streak = 0;
        self.locked_out = false;
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }
}
