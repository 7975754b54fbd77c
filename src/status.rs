//! Application readiness - single source of truth for what the UI may do.
//!
//! Status is never stored on its own: it is derived from asset presence,
//! per-asset download progress, and whether an inference call is in flight,
//! and recomputed every time the runtime processes an event.
//!
//! ```text
//! Empty ──any progress > ε──> Downloading ──both assets on disk──> Ready
//!   │                                                                │
//!   └────────inference starts────> Busy <────inference starts────────┘
//!                                   │
//!                     inference resolves (ok or failed)
//!                                   │
//!                        back to the derived status
//! ```

use serde::{Deserialize, Serialize};

/// Progress at or below this threshold is treated as "no transfer in flight".
pub const PROGRESS_EPSILON: f64 = 0.001;

/// Application status derived from [`ReadinessInputs`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    /// At least one required asset is missing and nothing is downloading.
    #[default]
    Empty,
    /// A transfer is in flight and not every asset is on disk yet.
    Downloading,
    /// Every required asset exists on disk; inference may run.
    Ready,
    /// An inference call is in flight.
    Busy,
}

/// Observed state of a single required asset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetState {
    /// Does the asset file exist at its final path?
    pub present: bool,
    /// Download fraction in [0.0, 1.0]. Only meaningful while a transfer is
    /// in flight; reset to 0.0 once the file is moved into place.
    pub progress: f64,
}

impl AssetState {
    fn transferring(&self) -> bool {
        self.progress > PROGRESS_EPSILON
    }
}

/// Everything status derives from - computed, not stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadinessInputs {
    pub llm: AssetState,
    pub projector: AssetState,
    pub inference_in_flight: bool,
}

impl ReadinessInputs {
    pub fn all_present(&self) -> bool {
        self.llm.present && self.projector.present
    }
}

/// Derive the application status.
///
/// Pure and side-effect-free; calling it repeatedly with unchanged inputs
/// yields the same value. Busy overrides while an inference call is in
/// flight, Ready wins over any stale progress value once both assets exist.
pub fn compute_status(inputs: &ReadinessInputs) -> AppStatus {
    if inputs.inference_in_flight {
        return AppStatus::Busy;
    }
    if inputs.all_present() {
        return AppStatus::Ready;
    }
    if inputs.llm.transferring() || inputs.projector.transferring() {
        return AppStatus::Downloading;
    }
    AppStatus::Empty
}

/// Human-readable status line for the same inputs.
///
/// Renders per-asset percentages while transfers are in flight, otherwise a
/// static readiness message. An in-flight inference call does not change the
/// line; it only affects [`compute_status`].
pub fn status_message(inputs: &ReadinessInputs) -> String {
    let llm = inputs.llm.transferring();
    let projector = inputs.projector.transferring();

    if llm && projector {
        format!(
            "downloading LLM {}%, projector {}%",
            percent(inputs.llm.progress),
            percent(inputs.projector.progress)
        )
    } else if llm {
        format!("downloading LLM {}%", percent(inputs.llm.progress))
    } else if projector {
        format!("downloading projector {}%", percent(inputs.projector.progress))
    } else if inputs.all_present() {
        "Ready".to_string()
    } else {
        "Please download the models first".to_string()
    }
}

fn percent(progress: f64) -> u32 {
    (progress.clamp(0.0, 1.0) * 100.0) as u32
}
