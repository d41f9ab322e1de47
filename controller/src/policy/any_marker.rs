use marker_signal_common::marker::MarkerSet;

use super::traits::PresencePolicy;

/// Signals whenever at least one marker, of any id, is visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyMarkerPolicy;

impl PresencePolicy for AnyMarkerPolicy {
    fn evaluate(&self, markers: &MarkerSet) -> bool {
        !markers.is_empty()
    }

    fn name(&self) -> &str {
        "any_marker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_visible_is_false() {
        assert!(!AnyMarkerPolicy.evaluate(&MarkerSet::new()));
    }

    #[test]
    fn any_id_is_true() {
        let markers: MarkerSet = [7].into_iter().collect();
        assert!(AnyMarkerPolicy.evaluate(&markers));

        let markers: MarkerSet = [0, 1023, -1].into_iter().collect();
        assert!(AnyMarkerPolicy.evaluate(&markers));
    }
}
