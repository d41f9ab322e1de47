pub mod any_marker;
pub mod missing_interest;
pub mod traits;

pub use any_marker::AnyMarkerPolicy;
pub use missing_interest::MissingInterestPolicy;
pub use traits::PresencePolicy;

use marker_signal_common::config::{DetectionConfig, PolicyKind};

/// Build the policy selected by the detection config.
pub fn from_config(config: &DetectionConfig) -> Box<dyn PresencePolicy> {
    match config.effective_policy() {
        PolicyKind::AnyMarker => Box::new(AnyMarkerPolicy),
        PolicyKind::MissingInterest => Box::new(MissingInterestPolicy::new(config.interest_set())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_signal_common::marker::MarkerSet;

    #[test]
    fn empty_interest_selects_any_marker() {
        let policy = from_config(&DetectionConfig::default());
        assert_eq!(policy.name(), "any_marker");
        assert!(!policy.evaluate(&MarkerSet::new()));
        assert!(policy.evaluate(&[7].into_iter().collect()));
    }

    #[test]
    fn interest_ids_select_missing_interest() {
        let config = DetectionConfig {
            interest_ids: vec![200, 300, 400],
            ..Default::default()
        };
        let policy = from_config(&config);
        assert_eq!(policy.name(), "missing_interest");
        assert!(!policy.evaluate(&[200, 300, 400].into_iter().collect()));
        assert!(policy.evaluate(&[200, 300].into_iter().collect()));
    }
}
