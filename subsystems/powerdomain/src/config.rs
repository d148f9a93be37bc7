//! Controller configuration.

/// Hardware polling bounds for transition confirmation.
///
/// The framework never infers these from the chip table; hosts choose them
/// for their platform. The defaults bound a transition wait at roughly one
/// millisecond (100 attempts x 10 us).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum status poll attempts per transition
    pub attempts: u32,
    /// Delay between attempts, in microseconds
    pub delay_us: u32,
}

impl PollConfig {
    /// Create a poll configuration.
    pub const fn new(attempts: u32, delay_us: u32) -> Self {
        Self { attempts, delay_us }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(100, 10)
    }
}
