//! Local connectivity probe.
//!
//! Distinguishes "the network is down on this machine" (`OFFLINE`) from "the
//! server is unreachable" (`NETWORK_ERROR`) when classifying connection
//! failures. Hosts with a platform connectivity signal implement
//! [`Connectivity`] over it; everything else uses [`AlwaysOnline`], which
//! collapses the distinction and classifies all connection failures as
//! network errors.

/// Source of the local online/offline signal.
pub trait Connectivity: Send + Sync {
    /// Whether the local machine currently has network connectivity.
    fn is_online(&self) -> bool;
}

/// Default probe: always reports online.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_online_reports_online() {
        assert!(AlwaysOnline.is_online());
    }

    #[test]
    fn connectivity_is_object_safe() {
        fn assert_object_safe(_: &dyn Connectivity) {}
        let _ = assert_object_safe;
    }
}
