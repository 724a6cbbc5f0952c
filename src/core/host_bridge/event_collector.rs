//=========================================================================
// Event Collector
//=========================================================================
//
// Host event collector with bounded polling and shutdown detection.
//
// Architecture:
//   Receiver<HostEvent> → collect_tick() → commands + latest input → TickControl
//
// Bounded polling prevents a flooding host from starving the tick. Only
// the newest input frame of a tick is kept, but cancel presses from any
// frame in the tick are preserved.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{HostCommand, HostEvent};
use crate::core::input::{ActionFlags, InputFrame};

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Drains host events once per tick.
pub(crate) struct EventCollector {
    receiver: Receiver<HostEvent>,
    commands: Vec<HostCommand>,
    input: Option<InputFrame>,
}

impl EventCollector {
    const MAX_EVENTS_PER_TICK: usize = 100;

    pub(crate) fn new(receiver: Receiver<HostEvent>) -> Self {
        Self {
            receiver,
            commands: Vec::with_capacity(4),
            input: None,
        }
    }

    /// Collects pending host events (bounded to prevent starvation).
    pub(crate) fn collect_tick(&mut self) -> TickControl {
        self.commands.clear();
        self.input = None;
        let mut drained = 0;

        while drained < Self::MAX_EVENTS_PER_TICK {
            match self.receiver.try_recv() {
                Ok(event) => {
                    drained += 1;
                    if self.handle_event(event) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("Host channel disconnected");
                    return TickControl::Exit;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= Self::MAX_EVENTS_PER_TICK {
            warn!("Host event backlog: drained {} events this tick", drained);
        }

        TickControl::Continue
    }

    /// Takes the commands collected this tick.
    pub(crate) fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Takes the input frame collected this tick, if any arrived.
    pub(crate) fn take_input(&mut self) -> Option<InputFrame> {
        self.input.take()
    }

    fn handle_event(&mut self, event: HostEvent) -> TickControl {
        match event {
            HostEvent::Command(command) => {
                self.commands.push(command);
                TickControl::Continue
            }
            HostEvent::Input(mut frame) => {
                if self.input.is_some_and(|f| f.is_pressed(ActionFlags::CANCEL)) {
                    frame.actions.insert(ActionFlags::CANCEL);
                }
                self.input = Some(frame);
                TickControl::Continue
            }
            HostEvent::Shutdown => TickControl::Exit,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
