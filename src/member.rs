use serde::Serialize;

use crate::engagement::Engagement;
use crate::interest::InterestProfile;
use crate::math::{remap_clamped, Rect, Vec2};

pub const MIN_SPEED_MULTIPLIER: f32 = 0.4;
pub const MAX_SPEED_MULTIPLIER: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MemberId {
    pub group: usize,
    pub local: usize,
}

#[derive(Clone, Debug)]
pub struct Member {
    pub id: MemberId,
    pub position: Vec2,
    pub velocity: Vec2,
    acceleration: Vec2,
    pub max_speed: f32,
    pub max_force: f32,
    interests: InterestProfile,
    /// Interest in the group's current topic, in `[0, max_interest]`.
    pub current_interest: f32,
    /// Velocity the member would like to move at given its interest.
    pub desired_velocity: f32,
    pub state: Engagement,
    pub(crate) at_risk_checks: u32,
}

impl Member {
    pub fn new(
        id: MemberId,
        interests: InterestProfile,
        position: Vec2,
        velocity: Vec2,
        max_speed: f32,
        max_force: f32,
    ) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            max_speed,
            max_force,
            interests,
            current_interest: 0.0,
            desired_velocity: 0.0,
            state: Engagement::Active,
            at_risk_checks: 0,
        }
    }

    pub fn interests(&self) -> &InterestProfile {
        &self.interests
    }

    pub fn primary_dim(&self) -> usize {
        self.interests.primary_dim()
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    /// Recomputes current interest and desired velocity against `topic_vector`.
    pub fn refresh_interest(&mut self, topic_vector: &[f32], max_interest: f32, max_velocity: f32) {
        self.current_interest = self.interests.predicted_interest(topic_vector, max_interest);
        self.desired_velocity = self.current_interest * max_velocity / max_interest;
    }

    pub fn interest_normalized(&self, max_interest: f32) -> f32 {
        self.current_interest / max_interest
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Speed cap scale: low desired velocity means slower motion.
    pub fn speed_multiplier(&self, max_velocity: f32) -> f32 {
        remap_clamped(
            self.desired_velocity,
            0.0,
            max_velocity,
            MIN_SPEED_MULTIPLIER,
            MAX_SPEED_MULTIPLIER,
        )
    }

    /// Applies the accumulated force, moves, clears the accumulator and clamps into `bounds`.
    pub fn integrate(&mut self, max_velocity: f32, bounds: &Rect, inset: f32) {
        if self.state.is_disengaged() {
            self.acceleration = Vec2::ZERO;
            return;
        }

        let cap = self.max_speed * self.speed_multiplier(max_velocity);
        self.velocity = (self.velocity + self.acceleration).limited(cap);
        self.position = bounds.clamp_inset(self.position + self.velocity, inset);
        self.acceleration = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::{Member, MemberId};
    use crate::engagement::Engagement;
    use crate::interest::InterestProfile;
    use crate::math::{Rect, Vec2};

    fn member() -> Member {
        Member::new(
            MemberId { group: 1, local: 2 },
            InterestProfile::from_weights(vec![1.0, 0.0, 0.0]),
            Vec2::new(50.0, 50.0),
            Vec2::ZERO,
            1.0,
            0.05,
        )
    }

    #[test]
    fn interest_scales_with_topic_match() {
        let mut m = member();
        m.refresh_interest(&[1.0, 0.0, 0.0], 10.0, 10.0);
        assert!((m.current_interest - 10.0).abs() < 1.0e-5);
        assert!((m.desired_velocity - 10.0).abs() < 1.0e-5);

        m.refresh_interest(&[0.0, 0.5, 0.5], 10.0, 10.0);
        assert_eq!(m.current_interest, 0.0);
        assert_eq!(m.desired_velocity, 0.0);
    }

    #[test]
    fn low_interest_caps_speed() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut m = member();
        m.refresh_interest(&[0.0, 1.0, 0.0], 10.0, 10.0);
        m.apply_force(Vec2::new(5.0, 0.0));
        m.integrate(10.0, &bounds, 5.0);
        assert!((m.velocity.length() - 0.4).abs() < 1.0e-5);
        assert_eq!(m.acceleration(), Vec2::ZERO);

        let mut eager = member();
        eager.refresh_interest(&[1.0, 0.0, 0.0], 10.0, 10.0);
        eager.apply_force(Vec2::new(5.0, 0.0));
        eager.integrate(10.0, &bounds, 5.0);
        assert!((eager.velocity.length() - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn integration_clamps_to_inset_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut m = member();
        m.position = Vec2::new(95.5, 50.0);
        m.velocity = Vec2::new(0.4, 0.0);
        m.integrate(10.0, &bounds, 5.0);
        assert_eq!(m.position.x, 95.0);
    }

    #[test]
    fn disengaged_member_does_not_move() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut m = member();
        m.state = Engagement::Disengaged;
        m.velocity = Vec2::new(1.0, 0.0);
        m.apply_force(Vec2::new(1.0, 1.0));
        m.integrate(10.0, &bounds, 5.0);
        assert_eq!(m.position, Vec2::new(50.0, 50.0));
        assert_eq!(m.acceleration(), Vec2::ZERO);
    }
}
