//! Read-only views handed to renderers and telemetry.

use serde::Serialize;

use crate::engagement::Engagement;
use crate::math::Vec2;
use crate::member::{Member, MemberId};
use crate::rescue::HaltReason;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: usize,
    pub active: usize,
    pub at_risk: usize,
    pub disengaged: usize,
    /// Catalog id of the current topic.
    pub current_topic: usize,
    pub current_topic_name: String,
    pub group_velocity: f32,
    pub halted: bool,
    pub halt_reason: Option<HaltReason>,
    pub frame: u64,
}

impl GroupStats {
    pub fn member_total(&self) -> usize {
        self.active + self.at_risk + self.disengaged
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemberView {
    pub id: MemberId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub current_interest: f32,
    pub state: Engagement,
    pub primary_dim: usize,
}

impl From<&Member> for MemberView {
    fn from(m: &Member) -> Self {
        Self {
            id: m.id,
            position: m.position,
            velocity: m.velocity,
            current_interest: m.current_interest,
            state: m.state,
            primary_dim: m.primary_dim(),
        }
    }
}

/// Engagement tallies over a member list.
pub fn count_states(members: &[Member]) -> (usize, usize, usize) {
    members
        .iter()
        .fold((0, 0, 0), |(active, at_risk, gone), m| match m.state {
            Engagement::Active => (active + 1, at_risk, gone),
            Engagement::AtRisk => (active, at_risk + 1, gone),
            Engagement::Disengaged => (active, at_risk, gone + 1),
        })
}
