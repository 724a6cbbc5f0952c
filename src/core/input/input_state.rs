//=========================================================================
// Input Frame
//
// One tick of normalized input: movement axes, pointer motion and
// discrete action flags.
//
//=========================================================================

//=== External Crates =====================================================
use bitflags::bitflags;
use nalgebra::Vector2;

//=== ActionFlags =========================================================

bitflags! {
    /// Discrete actions held during a tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u8 {
        const JUMP          = 1 << 0;
        const CROUCH        = 1 << 1;
        const SPRINT        = 1 << 2;
        const INTERACT      = 1 << 3;
        const CAMERA_SWITCH = 1 << 4;
        /// UI cancel. Routed to the back action, never to entities.
        const CANCEL        = 1 << 5;
    }
}

//=== InputFrame ==========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputFrame {
    /// Planar movement, x = strafe, y = forward.
    pub movement: Vector2<f32>,
    pub pointer_delta: Vector2<f32>,
    pub actions: ActionFlags,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self {
            movement: Vector2::zeros(),
            pointer_delta: Vector2::zeros(),
            actions: ActionFlags::empty(),
        }
    }
}

impl InputFrame {
    pub fn is_pressed(&self, action: ActionFlags) -> bool {
        self.actions.contains(action)
    }

    /// Copy of this frame without UI-only flags.
    pub fn gameplay(mut self) -> Self {
        self.actions.remove(ActionFlags::CANCEL);
        self
    }
}
