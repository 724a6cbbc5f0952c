//=========================================================================
// Event Queue
//=========================================================================
//
// FIFO of events waiting for delivery.
//
// Events published while a dispatch is running land here and are
// delivered, in publish order, before the outermost publish returns.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use super::GameEvent;

//=== EventQueue ==========================================================

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: VecDeque::new() }
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every queued event, preserving capacity.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
