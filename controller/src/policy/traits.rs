use marker_signal_common::marker::MarkerSet;

/// Decides the presence signal from the markers detected in one frame.
///
/// Implementations are pure: the same marker set always yields the same
/// signal, whatever frames came before it.
pub trait PresencePolicy: Send + Sync {
    /// Returns `true` to report "object detected" to the microcontroller.
    fn evaluate(&self, markers: &MarkerSet) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
