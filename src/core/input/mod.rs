//=========================================================================
// Input Gate
//
// Per-tick input snapshot with an externally toggled enabled flag.
//
// Responsibilities:
// - Hold the latest `InputFrame` supplied by the host
// - Zero the frame while input is disabled (no stuck keys after a pause)
// - Track pointer capture for the in-session HUD
//
// Notes:
// Raw device polling happens in the host; frames arrive already
// normalized. The UI controller is the only component that flips the
// enabled flag and the pointer capture.
//
//=========================================================================

//=== Submodules ==========================================================
mod input_state;

pub use input_state::{ActionFlags, InputFrame};

//=== External Crates =====================================================
use log::debug;

//=== InputGate ===========================================================
//
// Owns the current input frame and the gating flags.
//
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    enabled: bool,
    pointer_captured: bool,
    frame: InputFrame,
}

impl InputGate {
    //--- Construction -----------------------------------------------------
    //
    // Starts disabled with the pointer released: the application boots
    // into menus.
    //
    pub fn new() -> Self {
        Self::default()
    }

    //--- apply() ----------------------------------------------------------
    //
    // Accepts the host's frame for this tick. The cancel flag is a UI
    // action and never reaches entities.
    //
    pub fn apply(&mut self, frame: InputFrame) {
        self.frame = if self.enabled {
            frame.gameplay()
        } else {
            InputFrame::default()
        };
    }

    //--- Gating -----------------------------------------------------------

    /// Sets the enabled flag. Returns true if it changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if !enabled {
            self.frame = InputFrame::default();
        }
        debug!("Entity input {}", if enabled { "enabled" } else { "disabled" });
        true
    }

    pub fn capture_pointer(&mut self) {
        self.pointer_captured = true;
    }

    pub fn release_pointer(&mut self) {
        self.pointer_captured = false;
    }

    /// Clears accumulated pointer motion after a consumer has read it.
    pub fn reset_pointer_delta(&mut self) {
        self.frame.pointer_delta = InputFrame::default().pointer_delta;
    }

    //--- Query Methods ----------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn current(&self) -> &InputFrame {
        &self.frame
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
