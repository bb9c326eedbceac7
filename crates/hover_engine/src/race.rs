//! Race progression: checkpoints, laps and the end of the race

use crate::foundation::math::Pose;

/// Phase of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RacePhase {
    /// The player drives
    #[default]
    Playing,
    /// Finish line crossed, controls are locked
    Ended,
    /// End delay elapsed, the end screen is up
    PostEnd,
}

/// Result of crossing a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Not the next checkpoint in line, or the race is over
    Ignored,
    /// Next checkpoint validated
    Validated {
        /// Checkpoint validated
        id: u32,
    },
    /// Last checkpoint of a lap, another lap starts
    LapCompleted {
        /// Lap just completed, from 1
        lap: u32,
    },
    /// Last checkpoint of the last lap
    Finished,
}

/// Tracks the player's progress through a race
///
/// Checkpoints are numbered from 0 and must be crossed in order. Crossing
/// the last one completes a lap.
#[derive(Debug, Clone)]
pub struct RaceLogic {
    phase: RacePhase,
    time: f32,
    time_since_end: f32,
    end_duration: f32,
    next_checkpoint: u32,
    last_checkpoint: u32,
    lap: u32,
    laps_required: u32,
    respawn: Pose,
}

impl RaceLogic {
    /// Create a race over checkpoints `0..=last_checkpoint`
    pub fn new(last_checkpoint: u32, laps_required: u32, end_duration: f32, start: Pose) -> Self {
        Self {
            phase: RacePhase::Playing,
            time: 0.0,
            time_since_end: 0.0,
            end_duration,
            next_checkpoint: 0,
            last_checkpoint,
            lap: 1,
            laps_required: laps_required.max(1),
            respawn: start,
        }
    }

    /// Current phase
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Race clock
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Lap being driven, from 1
    pub fn lap(&self) -> u32 {
        self.lap
    }

    /// Checkpoint expected next
    pub fn next_checkpoint(&self) -> u32 {
        self.next_checkpoint
    }

    /// Where the player respawns
    pub fn respawn_pose(&self) -> &Pose {
        &self.respawn
    }

    /// Move the respawn point without validating anything
    pub fn set_respawn_pose(&mut self, pose: Pose) {
        self.respawn = pose;
    }

    /// Whether the finish line was crossed
    pub fn is_over(&self) -> bool {
        self.phase != RacePhase::Playing
    }

    /// Jump straight to the end screen, for self running demo races
    pub fn set_to_end_game(&mut self) {
        self.phase = RacePhase::PostEnd;
    }

    /// Advance the clocks, returns true on the tick the end screen is due
    pub fn update(&mut self, dt: f32) -> bool {
        self.time += dt;
        match self.phase {
            RacePhase::Playing => false,
            RacePhase::Ended => {
                self.time_since_end += dt;
                if self.time_since_end > self.end_duration {
                    self.phase = RacePhase::PostEnd;
                    log::info!("Race over after {:.2}s", self.time);
                    return true;
                }
                false
            }
            RacePhase::PostEnd => {
                self.time_since_end += dt;
                false
            }
        }
    }

    /// Player crossed checkpoint `id`, whose respawn pose is `respawn`
    pub fn validate_checkpoint(&mut self, id: u32, respawn: Pose) -> CheckpointOutcome {
        if self.is_over() || id != self.next_checkpoint {
            return CheckpointOutcome::Ignored;
        }
        self.respawn = respawn;

        if id < self.last_checkpoint {
            self.next_checkpoint += 1;
            return CheckpointOutcome::Validated { id };
        }

        self.next_checkpoint = 0;
        if self.lap < self.laps_required {
            let lap = self.lap;
            self.lap += 1;
            log::info!("Lap {lap} completed at {:.2}s", self.time);
            return CheckpointOutcome::LapCompleted { lap };
        }

        self.phase = RacePhase::Ended;
        self.time_since_end = 0.0;
        log::info!("Finish line crossed at {:.2}s", self.time);
        CheckpointOutcome::Finished
    }
}
