use std::num::NonZeroUsize;

/// Default number of presence checks or announcements running at once.
pub const DEFAULT_FAN_OUT: usize = 8;

#[derive(Debug, Clone)]
/// DhtApi Configurations
pub struct Config {
    /// Maximum number of concurrent collaborator calls issued by a single
    /// `provide` (both for the local presence checks and the announcements).
    ///
    /// The higher it is, the faster large batches are provided, at the cost
    /// of more simultaneous load on the block store and the routing layer.
    ///
    /// Defaults to [DEFAULT_FAN_OUT]
    pub fan_out: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fan_out: NonZeroUsize::new(DEFAULT_FAN_OUT).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
