//=========================================================================
// Startup Resource Verifier
//=========================================================================
//
// Bounded, tick-driven startup sequence. Checks every critical resource
// one per step, then waits for the UI controller and the orchestrator
// before handing control to the main menu.
//
// Phases:
//   Idle ─start→ Verifying ──all present──→ Holding(completion)
//                    │                          ↓
//                    │                   AwaitingPrerequisites
//                    │                     │            │
//                    │                  ready      budget spent
//                    │                     ↓            ↓
//                    │            initialize(MainMenu)  Holding(error)
//                    │                 Done(Ready)      ↓
//                    └──any missing──→ Holding(error) → quit(1)
//
// Every wait is counted in ticks. Nothing here suspends or retries.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::mem;

use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use crate::core::config::{ContentPaths, StartupConfig};
use crate::core::content::ResourcePath;
use crate::core::error::SessionError;
use crate::core::globals::{GlobalContext, GlobalSystems};
use crate::core::message_bus::{GameEvent, LoadingUpdate};
use crate::core::ui::UiState;

//=== Outcome Types =======================================================

/// Final result of startup verification.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifierOutcome {
    /// Every resource exists and the main menu has been initialized.
    Ready,
    /// These resources were missing; the host has been told to quit.
    MissingResources(Vec<ResourcePath>),
    /// A fatal error ended verification; the host has been told to quit.
    Failed(SessionError),
}

/// Result of one verifier step.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifierStatus {
    Running,
    Done(VerifierOutcome),
}

//=== Phases ==============================================================

#[derive(Debug, Clone)]
enum AfterHold {
    AwaitPrerequisites,
    Quit(VerifierOutcome),
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Verifying { next: usize, wait: u32 },
    Holding { remaining: u32, then: AfterHold },
    AwaitingPrerequisites { polls: u32 },
    Finished(VerifierOutcome),
}

//=== ResourceVerifier ====================================================

pub struct ResourceVerifier {
    resources: Vec<ResourcePath>,
    missing: Vec<ResourcePath>,
    timings: StartupConfig,
    phase: Phase,
}

impl ResourceVerifier {
    pub fn new(paths: &ContentPaths, timings: StartupConfig) -> Self {
        Self::with_resources(paths.critical_resources(), timings)
    }

    pub fn with_resources(resources: Vec<ResourcePath>, timings: StartupConfig) -> Self {
        Self {
            resources,
            missing: Vec::new(),
            timings,
            phase: Phase::Idle,
        }
    }

    /// Shows the loading screen and arms the first check.
    pub fn start(&mut self, context: &mut GlobalContext) {
        info!("Verifying {} critical resources", self.resources.len());
        self.missing.clear();
        context.publish(GameEvent::UiStateChangeRequested(UiState::LoadingScreen));
        context.publish(GameEvent::Loading(LoadingUpdate::Started(
            "Verifying resources...".into(),
        )));
        self.phase = Phase::Verifying { next: 0, wait: 0 };
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Resources found missing so far.
    pub fn missing(&self) -> &[ResourcePath] {
        &self.missing
    }

    //--- Stepping ---------------------------------------------------------

    /// Advances the sequence by one tick.
    pub fn step(&mut self, systems: &mut GlobalSystems, context: &mut GlobalContext) -> VerifierStatus {
        let phase = mem::replace(&mut self.phase, Phase::Idle);
        let (next, status) = match phase {
            Phase::Idle => {
                self.start(context);
                return VerifierStatus::Running;
            }
            Phase::Verifying { next, wait } if wait > 0 => (
                Phase::Verifying {
                    next,
                    wait: wait - 1,
                },
                VerifierStatus::Running,
            ),
            Phase::Verifying { next, .. } => (self.check(next, context), VerifierStatus::Running),
            Phase::Holding { remaining, then } if remaining > 0 => (
                Phase::Holding {
                    remaining: remaining - 1,
                    then,
                },
                VerifierStatus::Running,
            ),
            Phase::Holding {
                then: AfterHold::AwaitPrerequisites,
                ..
            } => (
                Phase::AwaitingPrerequisites { polls: 0 },
                VerifierStatus::Running,
            ),
            Phase::Holding {
                then: AfterHold::Quit(outcome),
                ..
            } => {
                error!("Startup failed, quitting");
                context.host.quit(1);
                (
                    Phase::Finished(outcome.clone()),
                    VerifierStatus::Done(outcome),
                )
            }
            Phase::AwaitingPrerequisites { polls } => self.poll_prerequisites(polls, systems, context),
            Phase::Finished(outcome) => (
                Phase::Finished(outcome.clone()),
                VerifierStatus::Done(outcome),
            ),
        };
        self.phase = next;
        status
    }

    fn check(&mut self, index: usize, context: &mut GlobalContext) -> Phase {
        let Some(path) = self.resources.get(index) else {
            return self.conclude_checks(context);
        };

        if context.content.exists(path) {
            debug!("Verified {}", path);
        } else {
            error!("Critical resource missing: {}", path);
            self.missing.push(path.clone());
        }

        let fraction = (index + 1) as f32 / self.resources.len() as f32;
        context.publish(GameEvent::Loading(LoadingUpdate::Progress {
            fraction,
            message: format!("Verifying: {}", path.file_name()),
        }));

        if index + 1 == self.resources.len() {
            self.conclude_checks(context)
        } else {
            Phase::Verifying {
                next: index + 1,
                wait: self.timings.check_interval_ticks,
            }
        }
    }

    fn conclude_checks(&mut self, context: &mut GlobalContext) -> Phase {
        if self.missing.is_empty() {
            info!("All critical resources present");
            context.publish(GameEvent::Loading(LoadingUpdate::Completed(
                "Verification complete!".into(),
            )));
            return Phase::Holding {
                remaining: self.timings.completion_hold_ticks,
                then: AfterHold::AwaitPrerequisites,
            };
        }

        context.publish(GameEvent::Loading(LoadingUpdate::Failed(
            "Critical resources missing! Check console for details.".into(),
        )));
        Phase::Holding {
            remaining: self.timings.error_hold_ticks,
            then: AfterHold::Quit(VerifierOutcome::MissingResources(self.missing.clone())),
        }
    }

    fn poll_prerequisites(
        &mut self,
        polls: u32,
        systems: &mut GlobalSystems,
        context: &mut GlobalContext,
    ) -> (Phase, VerifierStatus) {
        let ui_ready = systems.ui.as_ref().is_some_and(|ui| ui.is_attached());
        let orchestrator = systems.orchestrator.as_mut().filter(|o| o.is_attached());

        if let (true, Some(orchestrator)) = (ui_ready, orchestrator) {
            orchestrator.initialize(context);
            return (
                Phase::Finished(VerifierOutcome::Ready),
                VerifierStatus::Done(VerifierOutcome::Ready),
            );
        }

        let polls = polls + 1;
        if polls < self.timings.max_prerequisite_polls {
            return (Phase::AwaitingPrerequisites { polls }, VerifierStatus::Running);
        }

        let what = if ui_ready {
            "session orchestrator"
        } else {
            "ui controller"
        };
        let err = SessionError::PrerequisiteTimeout {
            what: what.into(),
            polls,
        };
        error!("{}", err);
        context.publish(GameEvent::Loading(LoadingUpdate::Failed(err.to_string())));
        (
            Phase::Holding {
                remaining: self.timings.error_hold_ticks,
                then: AfterHold::Quit(VerifierOutcome::Failed(err)),
            },
            VerifierStatus::Running,
        )
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
