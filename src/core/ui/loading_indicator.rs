//=========================================================================
// Loading Indicator
//
// Smoothed progress bar state driven by `LoadingUpdate` events.
//
// The displayed value eases toward the reported target each tick and
// snaps once close enough. A failure drops the bar back to zero and
// keeps the message on screen.
//
//=========================================================================

//=== Internal Dependencies ===============================================
use crate::core::message_bus::LoadingUpdate;

//=== Constants ===========================================================

const SMOOTHING_RATE: f32 = 8.0;
const SNAP_DISTANCE: f32 = 0.01;

//=== LoadingStatus =======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingStatus {
    #[default]
    Idle,
    Loading,
    Complete,
    Failed,
}

//=== LoadingIndicator ====================================================

#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    status: LoadingStatus,
    current: f32,
    target: f32,
    message: String,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a progress report.
    pub fn apply(&mut self, update: &LoadingUpdate) {
        match update {
            LoadingUpdate::Started(message) => {
                self.status = LoadingStatus::Loading;
                self.current = 0.0;
                self.target = 0.0;
                self.message = message.clone();
            }
            LoadingUpdate::Progress { fraction, message } => {
                self.status = LoadingStatus::Loading;
                self.target = fraction.clamp(0.0, 1.0);
                self.message = message.clone();
            }
            LoadingUpdate::Completed(message) => {
                self.status = LoadingStatus::Complete;
                self.target = 1.0;
                self.message = message.clone();
            }
            LoadingUpdate::Failed(message) => {
                self.status = LoadingStatus::Failed;
                self.current = 0.0;
                self.target = 0.0;
                self.message = message.clone();
            }
        }
    }

    /// Eases the displayed value toward the target.
    pub fn update(&mut self, dt: f32) {
        let factor = (dt * SMOOTHING_RATE).min(1.0);
        self.current += (self.target - self.current) * factor;
        if (self.target - self.current).abs() < SNAP_DISTANCE {
            self.current = self.target;
        }
    }

    //--- Query Methods ----------------------------------------------------

    pub fn status(&self) -> LoadingStatus {
        self.status
    }

    /// Displayed progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
