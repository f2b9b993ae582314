use crate::layout::TileGrid;
use crate::math::{Vec2, EPSILON};
use crate::member::Member;
use crate::topic::Topic;

pub const HEAT_PENALTY: f32 = 0.7;
pub const NOVELTY_BONUS: f32 = 0.1;
pub const MIN_TOPIC_WEIGHT: f32 = 0.01;

/// Attraction weight of one topic for a member: squared match, damped by heat,
/// boosted when unvisited.
pub fn topic_weight(member: &Member, topic: &Topic) -> f32 {
    let score = member.interests().match_score(topic.vector());
    let mut weight = score * score * (1.0 - topic.heat() * HEAT_PENALTY);
    if topic.visit_count() == 0 {
        weight += NOVELTY_BONUS;
    }
    weight.max(MIN_TOPIC_WEIGHT)
}

/// Unit vector from the member toward the weighted centre of the topic tiles it prefers.
pub fn interest_pull(member: &Member, topics: &[Topic], grid: &TileGrid) -> Vec2 {
    let (sum, total_weight) = topics
        .iter()
        .fold((Vec2::ZERO, 0.0f32), |(sum, total), topic| {
            let weight = topic_weight(member, topic);
            (sum + grid.tile_center(topic.col, topic.row) * weight, total + weight)
        });

    if total_weight <= EPSILON {
        return Vec2::ZERO;
    }
    (sum / total_weight - member.position).normalized()
}
