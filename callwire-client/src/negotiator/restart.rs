/// Result of feeding a connectivity change to the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    NotNeeded,
    /// An ICE-restart offer will be produced once signaling is stable.
    Scheduled,
    /// No attempts left; the connection is reported lost.
    Exhausted,
}

/// Automatic restarts left before the next successful connection.
#[derive(Debug, Clone)]
pub struct RestartBudget {
    max_attempts: u32,
    used: u32,
}

impl RestartBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            used: 0,
        }
    }

    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.max_attempts {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn refill(&mut self) {
        self.used = 0;
    }

    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.used
    }
}
