use marker_signal_common::marker::{InterestSet, MarkerSet};
use tracing::trace;

use super::traits::PresencePolicy;

/// Signals when the expected marker constellation is incomplete.
///
/// The signal is `true` as soon as any id of interest is missing from the
/// frame, and `false` only when every one of them is visible. An empty
/// interest set never signals.
#[derive(Debug, Clone)]
pub struct MissingInterestPolicy {
    interest: InterestSet,
}

impl MissingInterestPolicy {
    pub fn new(interest: InterestSet) -> Self {
        Self { interest }
    }
}

impl PresencePolicy for MissingInterestPolicy {
    fn evaluate(&self, markers: &MarkerSet) -> bool {
        match self.interest.missing_from(markers).next() {
            Some(missing) => {
                trace!(missing, "marker of interest not visible");
                true
            }
            None => false,
        }
    }

    fn name(&self) -> &str {
        "missing_interest"
    }
}
