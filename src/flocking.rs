//! Boid forces for one group.
//!
//! All forces read a frozen view of the group (member slice plus a neighbour
//! grid built from the same positions) and return fresh vectors, so every
//! member's acceleration can be computed before any member moves.

use crate::config::{ModeParams, SimParams};
use crate::math::{Rect, Vec2, EPSILON};
use crate::member::Member;
use crate::neighbor_grid::NeighborGrid;

pub const COHESION_BASE: f32 = 0.4;
pub const ALIGNMENT_BASE: f32 = 0.4;
pub const PULL_BASE: f32 = 0.3;

pub struct FlockingField<'a> {
    members: &'a [Member],
    grid: &'a NeighborGrid,
    mode: ModeParams,
    bounds: Rect,
}

/// Per-member inputs that do not come from neighbours.
#[derive(Clone, Copy, Debug)]
pub struct ExternalForces {
    pub interest_pull: Vec2,
    pub momentum: Vec2,
}

impl<'a> FlockingField<'a> {
    pub fn new(
        members: &'a [Member],
        grid: &'a NeighborGrid,
        mode: ModeParams,
        bounds: Rect,
    ) -> Self {
        Self {
            members,
            grid,
            mode,
            bounds,
        }
    }

    pub fn cohesion(&self, i: usize) -> Vec2 {
        let m = &self.members[i];
        let (sum, count) =
            self.engaged_within(i, self.mode.cohesion_radius, |other| other.position);
        if count == 0 {
            return Vec2::ZERO;
        }
        steer_towards(sum / count as f32 - m.position, m)
    }

    pub fn alignment(&self, i: usize) -> Vec2 {
        let m = &self.members[i];
        let (sum, count) =
            self.engaged_within(i, self.mode.alignment_radius, |other| other.velocity);
        if count == 0 {
            return Vec2::ZERO;
        }
        steer_towards(sum / count as f32, m)
    }

    /// Push away from every neighbour in the separation radius, disengaged or not.
    pub fn separation(&self, i: usize) -> Vec2 {
        let m = &self.members[i];
        let radius = self.mode.separation_radius;
        let mut steering = Vec2::ZERO;

        self.grid.for_each_neighbor(i, radius, |j| {
            let away = m.position - self.members[j].position;
            let d_sq = away.length_sq();
            if d_sq > EPSILON && d_sq < radius * radius {
                steering += away / d_sq;
            }
        });

        steering.limited(m.max_force)
    }

    /// Fixed push off each edge the member is within the margin of.
    pub fn boundary(&self, i: usize) -> Vec2 {
        boundary_repulsion(
            self.members[i].position,
            &self.bounds,
            self.mode.boundary_margin,
            self.mode.boundary_push,
        )
    }

    /// Weighted sum of every force acting on member `i`.
    pub fn acceleration(&self, i: usize, external: ExternalForces, params: &SimParams) -> Vec2 {
        let m = &self.members[i];
        if m.state.is_disengaged() {
            return Vec2::ZERO;
        }

        let interest = m.interest_normalized(params.max_interest);
        let flock_scale = COHESION_BASE + interest * (1.0 - COHESION_BASE);
        let align_scale = ALIGNMENT_BASE + interest * (1.0 - ALIGNMENT_BASE);
        let pull_scale = PULL_BASE + interest * (1.0 - PULL_BASE);

        self.cohesion(i) * (params.cohesion_weight * flock_scale)
            + self.alignment(i) * (params.alignment_weight * align_scale)
            + self.separation(i) * params.separation_weight
            + external.interest_pull * (params.interest_pull_weight * m.max_force * pull_scale)
            + self.boundary(i)
            + external.momentum * (params.momentum_weight * m.max_force)
    }

    fn engaged_within<F>(&self, i: usize, radius: f32, pick: F) -> (Vec2, usize)
    where
        F: Fn(&Member) -> Vec2,
    {
        let origin = self.members[i].position;
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;

        self.grid.for_each_neighbor(i, radius, |j| {
            let other = &self.members[j];
            if other.state.is_disengaged() || other.position.distance(origin) >= radius {
                return;
            }
            sum += pick(other);
            count += 1;
        });

        (sum, count)
    }
}

/// Reynolds steering: desired at full speed minus current velocity, capped at max force.
pub fn steer_towards(target: Vec2, member: &Member) -> Vec2 {
    (target.with_magnitude(member.max_speed) - member.velocity).limited(member.max_force)
}

pub fn boundary_repulsion(position: Vec2, bounds: &Rect, margin: f32, push: f32) -> Vec2 {
    let mut repulsion = Vec2::ZERO;
    if position.x < bounds.x + margin {
        repulsion += Vec2::new(push, 0.0);
    }
    if position.x > bounds.right() - margin {
        repulsion += Vec2::new(-push, 0.0);
    }
    if position.y < bounds.y + margin {
        repulsion += Vec2::new(0.0, push);
    }
    if position.y > bounds.bottom() - margin {
        repulsion += Vec2::new(0.0, -push);
    }
    repulsion
}
