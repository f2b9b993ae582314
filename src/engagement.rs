//! Member engagement lifecycle.
//!
//! `Active` and `AtRisk` flip on the gap between the group's mean desired
//! velocity and the member's own. A member stuck in `AtRisk` for
//! `disengage_after_checks` consecutive checks becomes `Disengaged`, which is
//! terminal until the group is rebuilt.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::member::Member;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    #[default]
    Active,
    AtRisk,
    Disengaged,
}

impl Engagement {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Active => 0,
            Self::AtRisk => 1,
            Self::Disengaged => 2,
        }
    }

    pub fn is_disengaged(self) -> bool {
        self == Self::Disengaged
    }
}

/// Thresholds for one engagement check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngagementRule {
    pub recovery_threshold: f32,
    pub disengage_after_checks: u32,
}

/// Next state and at-risk streak for one member given its relative velocity.
pub fn transition(
    state: Engagement,
    at_risk_checks: u32,
    relative_velocity: f32,
    rule: EngagementRule,
) -> (Engagement, u32) {
    let lagging = relative_velocity > rule.recovery_threshold;
    let next = match state {
        Engagement::Active if lagging => Engagement::AtRisk,
        Engagement::AtRisk if !lagging => Engagement::Active,
        other => other,
    };

    if next != Engagement::AtRisk {
        return (next, 0);
    }

    let streak = at_risk_checks.saturating_add(1);
    if rule.disengage_after_checks > 0 && streak >= rule.disengage_after_checks {
        (Engagement::Disengaged, 0)
    } else {
        (Engagement::AtRisk, streak)
    }
}

/// Mean desired velocity of members that have not disengaged.
pub fn group_velocity(members: &[Member]) -> f32 {
    let (sum, count) = members
        .iter()
        .filter(|m| !m.state.is_disengaged())
        .fold((0.0, 0usize), |(sum, count), m| {
            (sum + m.desired_velocity, count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Runs one engagement check over the whole group. Returns the group velocity used.
pub fn update_states(members: &mut [Member], rule: EngagementRule) -> f32 {
    let v_group = group_velocity(members);

    for member in members.iter_mut() {
        let relative = v_group - member.desired_velocity;
        let (next, streak) = transition(member.state, member.at_risk_checks, relative, rule);
        if next != member.state {
            debug!(
                group = member.id.group,
                member = member.id.local,
                from = ?member.state,
                to = ?next,
                relative_velocity = relative,
                "engagement changed"
            );
        }
        member.state = next;
        member.at_risk_checks = streak;
    }

    v_group
}

#[cfg(test)]
mod tests {
    use super::{group_velocity, transition, update_states, Engagement, EngagementRule};
    use crate::interest::InterestProfile;
    use crate::math::Vec2;
    use crate::member::{Member, MemberId};

    const RULE: EngagementRule = EngagementRule {
        recovery_threshold: 1.0,
        disengage_after_checks: 0,
    };

    fn member(local: usize, desired_velocity: f32) -> Member {
        let mut m = Member::new(
            MemberId { group: 0, local },
            InterestProfile::from_weights(vec![1.0, 0.0]),
            Vec2::ZERO,
            Vec2::ZERO,
            0.9,
            0.05,
        );
        m.desired_velocity = desired_velocity;
        m
    }

    #[test]
    fn lagging_member_goes_at_risk_and_recovers() {
        let eps = 0.01;
        let (state, streak) = transition(Engagement::Active, 0, 1.0 + eps, RULE);
        assert_eq!(state, Engagement::AtRisk);
        assert_eq!(streak, 1);

        let (state, streak) = transition(state, streak, 1.0 + eps, RULE);
        assert_eq!(state, Engagement::AtRisk);
        assert_eq!(streak, 2);

        let (state, streak) = transition(state, streak, 1.0 - eps, RULE);
        assert_eq!(state, Engagement::Active);
        assert_eq!(streak, 0);
    }

    #[test]
    fn gap_at_threshold_is_not_lagging() {
        assert_eq!(transition(Engagement::Active, 0, 1.0, RULE).0, Engagement::Active);
        assert_eq!(transition(Engagement::AtRisk, 1, 1.0, RULE).0, Engagement::Active);
    }

    #[test]
    fn persistent_lag_disengages() {
        let rule = EngagementRule {
            recovery_threshold: 1.0,
            disengage_after_checks: 3,
        };
        let mut state = (Engagement::Active, 0);
        let mut seen = Vec::new();
        for _ in 0..4 {
            state = transition(state.0, state.1, 2.0, rule);
            seen.push(state.0);
        }
        assert_eq!(
            seen,
            vec![
                Engagement::AtRisk,
                Engagement::AtRisk,
                Engagement::Disengaged,
                Engagement::Disengaged,
            ]
        );
    }

    #[test]
    fn disengaged_is_terminal() {
        let rule = EngagementRule {
            recovery_threshold: 1.0,
            disengage_after_checks: 2,
        };
        assert_eq!(transition(Engagement::Disengaged, 0, -5.0, rule).0, Engagement::Disengaged);
    }

    #[test]
    fn group_velocity_skips_disengaged_members() {
        let mut members = vec![member(0, 4.0), member(1, 6.0), member(2, 100.0)];
        members[2].state = Engagement::Disengaged;
        assert!((group_velocity(&members) - 5.0).abs() < 1.0e-6);
        assert_eq!(group_velocity(&[]), 0.0);
    }

    #[test]
    fn update_flags_only_the_slow_member() {
        let mut members = vec![member(0, 6.0), member(1, 6.0), member(2, 6.0), member(3, 1.0)];
        let v = update_states(&mut members, RULE);
        assert!((v - 4.75).abs() < 1.0e-6);
        let states: Vec<_> = members.iter().map(|m| m.state).collect();
        assert_eq!(
            states,
            vec![
                Engagement::Active,
                Engagement::Active,
                Engagement::Active,
                Engagement::AtRisk,
            ]
        );
    }
}
