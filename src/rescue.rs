//! Group rescue steering.
//!
//! When members are at risk the group looks at topics similar to the current
//! one, keeps those every at-risk member would care about, and heads for the
//! one whose least interested member is most interested (maximin).

use serde::Serialize;

use crate::engagement::Engagement;
use crate::math::Vec2;
use crate::member::Member;
use crate::topic::Topic;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// No other topic is similar enough to the current one.
    NoNeighborTopics,
    /// No neighbouring topic interests every at-risk member.
    NoViableTopic,
    /// Too few members are still engaged to carry the conversation.
    TooFewActive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RescueOutcome {
    Idle,
    Steered { topic: usize },
    Halted(HaltReason),
}

#[derive(Clone, Copy, Debug)]
pub struct RescueParams {
    pub neighbor_topics_threshold: f32,
    pub recovery_threshold: f32,
    pub max_interest: f32,
}

/// Indices of topics other than `current` whose similarity to it exceeds `threshold`.
pub fn neighbor_topics(topics: &[Topic], current: usize, threshold: f32) -> Vec<usize> {
    let Some(current_topic) = topics.get(current) else {
        return Vec::new();
    };
    topics
        .iter()
        .enumerate()
        .filter(|&(i, t)| i != current && current_topic.similarity(t) > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Row of `table` (candidate x member) whose minimum is largest. Earlier rows win ties.
pub fn select_maximin<R: AsRef<[f32]>>(table: &[R]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (row, values) in table.iter().enumerate() {
        let worst = values
            .as_ref()
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        if best.map_or(true, |(_, best_min)| worst > best_min) {
            best = Some((row, worst));
        }
    }
    best.map(|(row, _)| row)
}

/// Decides what the group should do this check. Pure: nothing is mutated.
pub fn plan_rescue(
    members: &[Member],
    topics: &[Topic],
    current: usize,
    params: RescueParams,
) -> RescueOutcome {
    let at_risk: Vec<&Member> = members
        .iter()
        .filter(|m| m.state == Engagement::AtRisk)
        .collect();
    if at_risk.is_empty() {
        return RescueOutcome::Idle;
    }

    let neighbors = neighbor_topics(topics, current, params.neighbor_topics_threshold);
    if neighbors.is_empty() {
        return RescueOutcome::Halted(HaltReason::NoNeighborTopics);
    }

    let predicted = |m: &Member, t: usize| {
        m.interests()
            .predicted_interest(topics[t].vector(), params.max_interest)
    };

    let viable: Vec<usize> = neighbors
        .into_iter()
        .filter(|&t| {
            at_risk
                .iter()
                .all(|m| predicted(m, t) > params.recovery_threshold)
        })
        .collect();
    if viable.is_empty() {
        return RescueOutcome::Halted(HaltReason::NoViableTopic);
    }

    let table: Vec<Vec<f32>> = viable
        .iter()
        .map(|&t| members.iter().map(|m| predicted(m, t)).collect())
        .collect();

    match select_maximin(&table) {
        Some(row) => RescueOutcome::Steered { topic: viable[row] },
        None => RescueOutcome::Halted(HaltReason::NoViableTopic),
    }
}

/// Step from `centroid` toward `target`, at most `max_step` long.
pub fn rescue_nudge(centroid: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    (target - centroid).limited(max_step)
}

#[cfg(test)]
mod tests {
    use super::{
        neighbor_topics, plan_rescue, rescue_nudge, select_maximin, HaltReason, RescueOutcome,
        RescueParams,
    };
    use crate::engagement::Engagement;
    use crate::interest::InterestProfile;
    use crate::math::Vec2;
    use crate::member::{Member, MemberId};
    use crate::topic::Topic;

    const PARAMS: RescueParams = RescueParams {
        neighbor_topics_threshold: 0.5,
        recovery_threshold: 1.0,
        max_interest: 10.0,
    };

    fn member(local: usize, weights: Vec<f32>, state: Engagement) -> Member {
        let mut m = Member::new(
            MemberId { group: 0, local },
            InterestProfile::from_weights(weights),
            Vec2::ZERO,
            Vec2::ZERO,
            0.9,
            0.05,
        );
        m.state = state;
        m
    }

    fn topic(id: usize, vector: Vec<f32>) -> Topic {
        Topic::with_vector(id, format!("t{id}"), id, 0, vector)
    }

    #[test]
    fn maximin_picks_best_worst_case() {
        // rows: candidate topics, columns: at-risk members
        let table: [[f32; 2]; 3] = [[3.0, 8.0], [5.0, 4.0], [9.0, 2.0]];
        // minima: 3, 4, 2 -> candidate 1
        assert_eq!(select_maximin(&table), Some(1));
    }

    #[test]
    fn maximin_ties_keep_first_candidate() {
        let table: [[f32; 2]; 3] = [[4.0, 6.0], [6.0, 4.0], [1.0, 9.0]];
        assert_eq!(select_maximin(&table), Some(0));
        assert_eq!(select_maximin::<[f32; 2]>(&[]), None);
    }

    #[test]
    fn idle_without_at_risk_members() {
        let members = vec![member(0, vec![1.0, 0.0], Engagement::Active)];
        let topics = vec![topic(0, vec![1.0, 0.0]), topic(1, vec![1.0, 0.1])];
        assert_eq!(plan_rescue(&members, &topics, 0, PARAMS), RescueOutcome::Idle);
    }

    #[test]
    fn halts_when_no_topic_is_similar() {
        let members = vec![member(0, vec![1.0, 0.0], Engagement::AtRisk)];
        let topics = vec![topic(0, vec![1.0, 0.0]), topic(1, vec![0.0, 1.0])];
        assert_eq!(
            plan_rescue(&members, &topics, 0, PARAMS),
            RescueOutcome::Halted(HaltReason::NoNeighborTopics)
        );
    }

    #[test]
    fn halts_when_at_risk_member_cares_about_nothing_nearby() {
        let members = vec![
            member(0, vec![1.0, 0.0, 0.0], Engagement::Active),
            member(1, vec![0.0, 0.0, 1.0], Engagement::AtRisk),
        ];
        let topics = vec![
            topic(0, vec![1.0, 0.0, 0.0]),
            topic(1, vec![0.8, 0.2, 0.0]),
        ];
        assert_eq!(
            plan_rescue(&members, &topics, 0, PARAMS),
            RescueOutcome::Halted(HaltReason::NoViableTopic)
        );
    }

    #[test]
    fn steers_to_topic_maximising_minimum_interest() {
        let members = vec![
            member(0, vec![1.0, 0.0, 0.0], Engagement::Active),
            member(1, vec![0.0, 1.0, 0.0], Engagement::AtRisk),
            member(2, vec![0.0, 0.0, 1.0], Engagement::AtRisk),
        ];
        let topics = vec![
            topic(0, vec![0.4, 0.3, 0.3]),
            // member 2 would only reach 0.5: not viable
            topic(1, vec![0.65, 0.3, 0.05]),
            // interests 5.0, 2.5, 2.5 -> min 2.5
            topic(2, vec![0.5, 0.25, 0.25]),
            // interests 3.4, 3.3, 3.3 -> min 3.3
            topic(3, vec![0.34, 0.33, 0.33]),
            // interests 2.0, 4.0, 4.0 -> min 2.0
            topic(4, vec![0.2, 0.4, 0.4]),
        ];

        assert_eq!(neighbor_topics(&topics, 0, 0.5), vec![1, 2, 3, 4]);
        assert_eq!(
            plan_rescue(&members, &topics, 0, PARAMS),
            RescueOutcome::Steered { topic: 3 }
        );
    }

    #[test]
    fn nudge_is_capped() {
        let far = rescue_nudge(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 0.1);
        assert!((far.x - 0.1).abs() < 1.0e-6);
        let close = rescue_nudge(Vec2::new(2.0, 1.0), Vec2::new(2.05, 1.0), 0.1);
        assert!((close.x - 0.05).abs() < 1.0e-6);
        assert_eq!(close.y, 0.0);
    }
}
