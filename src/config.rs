use serde::{Deserialize, Serialize};

use crate::math::clamp_finite;

pub const MAX_GRID_SIDE: usize = 64;
pub const MAX_GROUP_SIZE: usize = 256;
pub const MAX_HISTORY_CAPACITY: usize = 1_024;
pub const MAX_CHECK_FREQUENCY: u32 = 10_000;

/// Tunables for one simulation run.
///
/// The value is treated as immutable while a frame is being stepped; live
/// tuning replaces the whole value between frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub cohesion_weight: f32,
    pub alignment_weight: f32,
    pub separation_weight: f32,
    pub interest_pull_weight: f32,
    /// Velocity gap that flags a member as at-risk, and the predicted
    /// interest a rescue topic must exceed for every at-risk member.
    pub recovery_threshold: f32,
    /// Cosine similarity a topic needs to count as a neighbour of the current one.
    pub neighbor_topics_threshold: f32,
    /// Frames between engagement checks.
    pub check_frequency: u32,
    pub heat_decay_rate: f32,
    pub momentum_weight: f32,
    pub single_group_mode: bool,
    pub paused: bool,
    pub grid_cols: usize,
    pub grid_rows: usize,
    pub group_size: usize,
    /// Consecutive at-risk checks before a member disengages; 0 never disengages.
    pub disengage_after_checks: u32,
    /// A group with fewer non-disengaged members halts; 0 disables the floor.
    pub min_active_members: usize,
    /// Largest centroid nudge applied by rescue steering per check.
    pub rescue_step: f32,
    /// Load-time perturbation applied to each catalog weight.
    pub topic_jitter: f32,
    pub max_interest: f32,
    pub max_velocity: f32,
    pub history_capacity: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            cohesion_weight: 2.0,
            alignment_weight: 0.8,
            separation_weight: 1.0,
            interest_pull_weight: 0.5,
            recovery_threshold: 1.0,
            neighbor_topics_threshold: 0.5,
            check_frequency: 45,
            heat_decay_rate: 0.008,
            momentum_weight: 0.3,
            single_group_mode: false,
            paused: false,
            grid_cols: 5,
            grid_rows: 4,
            group_size: 10,
            disengage_after_checks: 4,
            min_active_members: 3,
            rescue_step: 0.1,
            topic_jitter: 0.025,
            max_interest: 10.0,
            max_velocity: 10.0,
            history_capacity: 20,
        }
    }
}

impl SimParams {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.max_interest = clamp_finite(self.max_interest, 0.01, 1_000.0, defaults.max_interest);
        self.max_velocity = clamp_finite(self.max_velocity, 0.01, 1_000.0, defaults.max_velocity);
        self.cohesion_weight =
            clamp_finite(self.cohesion_weight, 0.0, 10.0, defaults.cohesion_weight);
        self.alignment_weight =
            clamp_finite(self.alignment_weight, 0.0, 10.0, defaults.alignment_weight);
        self.separation_weight =
            clamp_finite(self.separation_weight, 0.0, 10.0, defaults.separation_weight);
        self.interest_pull_weight = clamp_finite(
            self.interest_pull_weight,
            0.0,
            10.0,
            defaults.interest_pull_weight,
        );
        self.recovery_threshold = clamp_finite(
            self.recovery_threshold,
            0.0,
            self.max_interest.max(self.max_velocity),
            defaults.recovery_threshold,
        );
        self.neighbor_topics_threshold = clamp_finite(
            self.neighbor_topics_threshold,
            -1.0,
            1.0,
            defaults.neighbor_topics_threshold,
        );
        self.check_frequency = self.check_frequency.clamp(1, MAX_CHECK_FREQUENCY);
        self.heat_decay_rate =
            clamp_finite(self.heat_decay_rate, 0.0, 1.0, defaults.heat_decay_rate);
        self.momentum_weight =
            clamp_finite(self.momentum_weight, 0.0, 10.0, defaults.momentum_weight);
        self.grid_cols = self.grid_cols.clamp(1, MAX_GRID_SIDE);
        self.grid_rows = self.grid_rows.clamp(1, MAX_GRID_SIDE);
        self.group_size = self.group_size.clamp(1, MAX_GROUP_SIZE);
        self.min_active_members = self.min_active_members.min(self.group_size);
        self.rescue_step = clamp_finite(self.rescue_step, 0.0, 1_000.0, defaults.rescue_step);
        self.topic_jitter = clamp_finite(self.topic_jitter, 0.0, 0.5, defaults.topic_jitter);
        self.history_capacity = self.history_capacity.clamp(1, MAX_HISTORY_CAPACITY);
    }

    /// Sanitised copy, leaving `self` untouched.
    pub fn sanitized(&self) -> Self {
        let mut params = self.clone();
        params.sanitize();
        params
    }

    pub fn mode(&self) -> ModeParams {
        ModeParams::for_mode(self.single_group_mode)
    }
}

/// Per-mode radii and motion caps, resolved once per group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeParams {
    pub cohesion_radius: f32,
    pub alignment_radius: f32,
    pub separation_radius: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub boundary_margin: f32,
    pub boundary_push: f32,
    pub bounds_inset: f32,
}

const MULTI_GROUP: ModeParams = ModeParams {
    cohesion_radius: 50.0,
    alignment_radius: 40.0,
    separation_radius: 15.0,
    max_speed: 0.9,
    max_force: 0.05,
    boundary_margin: 8.0,
    boundary_push: 0.08,
    bounds_inset: 5.0,
};

const SINGLE_GROUP: ModeParams = ModeParams {
    cohesion_radius: 80.0,
    alignment_radius: 65.0,
    separation_radius: 25.0,
    max_speed: 1.4,
    max_force: 0.07,
    boundary_margin: 8.0,
    boundary_push: 0.08,
    bounds_inset: 5.0,
};

impl ModeParams {
    pub fn for_mode(single_group: bool) -> Self {
        if single_group {
            SINGLE_GROUP
        } else {
            MULTI_GROUP
        }
    }

    /// Largest interaction radius; sizes the neighbour grid cells.
    pub fn query_radius(&self) -> f32 {
        self.cohesion_radius
            .max(self.alignment_radius)
            .max(self.separation_radius)
    }
}
