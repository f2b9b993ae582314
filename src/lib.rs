//! Conversation groups drifting across a 2-D map of discussion topics.
//!
//! Members flock like boids, are pulled toward topics matching their latent
//! interests, fall behind when the group's topic bores them, and may be
//! rescued by the group steering toward a topic everyone can live with.
//! [`Sim`] exposes a [`World`] to JavaScript; the rest of the crate is plain Rust.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod engagement;
pub mod error;
pub mod flocking;
pub mod group;
pub mod history;
pub mod interest;
pub mod layout;
pub mod math;
pub mod member;
pub mod neighbor_grid;
pub mod rescue;
pub mod rng;
pub mod snapshot;
pub mod steering;
pub mod topic;
pub mod world;

pub use config::{ModeParams, SimParams};
pub use engagement::Engagement;
pub use error::GroupError;
pub use group::{Group, StepOutcome};
pub use math::{Rect, Vec2};
pub use member::{Member, MemberId};
pub use rescue::HaltReason;
pub use snapshot::{GroupStats, MemberView};
pub use topic::{Topic, TopicEntry};
pub use world::{World, WorldStats};

/// Splits a flat `names.len() * dims` buffer into catalog entries.
pub fn catalog_from_flat(
    names: Vec<String>,
    values: &[f32],
    dims: usize,
) -> Result<Vec<TopicEntry>, GroupError> {
    if dims == 0 {
        return Err(GroupError::ZeroDimensions);
    }
    if values.len() != names.len() * dims {
        return Err(GroupError::CatalogShape {
            names: names.len(),
            values: values.len(),
            dims,
        });
    }
    Ok(names
        .into_iter()
        .zip(values.chunks_exact(dims))
        .map(|(name, vector)| TopicEntry::new(name, vector.to_vec()))
        .collect())
}

#[wasm_bindgen]
pub struct Sim {
    world: World,
}

#[wasm_bindgen]
impl Sim {
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f32,
        height: f32,
        topic_names: Vec<String>,
        topic_vectors: Vec<f32>,
        dims: usize,
        seed: Option<u32>,
    ) -> Result<Sim, JsError> {
        let catalog = catalog_from_flat(topic_names, &topic_vectors, dims)?;
        let seed = seed.map(u64::from).unwrap_or_else(rng::entropy_seed);
        let world = World::new(SimParams::default(), width, height, catalog, seed)?;
        Ok(Sim { world })
    }

    pub fn step(&mut self) {
        self.world.step();
    }

    pub fn step_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.world.step();
        }
    }

    pub fn restart(&mut self) -> Result<(), JsError> {
        self.world.reset()?;
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.world.set_paused(paused);
    }

    pub fn paused(&self) -> bool {
        self.world.params().paused
    }

    pub fn set_single_group_mode(&mut self, single: bool) -> Result<(), JsError> {
        let params = SimParams {
            single_group_mode: single,
            ..self.world.params().clone()
        };
        self.world.set_params(params)?;
        Ok(())
    }

    /// Replaces the parameters with a JSON object; missing fields take defaults.
    pub fn set_params_json(&mut self, json: &str) -> Result<(), JsError> {
        let params: SimParams = serde_json::from_str(json)?;
        self.world.set_params(params)?;
        Ok(())
    }

    pub fn params_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.world.params())?)
    }

    pub fn group_count(&self) -> usize {
        self.world.groups().len()
    }

    pub fn world_stats_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.world.stats())?)
    }

    pub fn group_stats_json(&self, group: usize) -> Result<String, JsError> {
        let group = self.group(group)?;
        Ok(serde_json::to_string(&group.stats())?)
    }

    pub fn history_json(&self, group: usize) -> Result<String, JsError> {
        let group = self.group(group)?;
        Ok(serde_json::to_string(group.history())?)
    }

    /// Interleaved `x, y` per member.
    pub fn member_positions(&self, group: usize) -> Vec<f32> {
        self.member_buffer(group, |m| [m.position.x, m.position.y])
    }

    /// Interleaved `vx, vy` per member.
    pub fn member_velocities(&self, group: usize) -> Vec<f32> {
        self.member_buffer(group, |m| [m.velocity.x, m.velocity.y])
    }

    pub fn member_interests(&self, group: usize) -> Vec<f32> {
        self.member_buffer(group, |m| [m.current_interest])
    }

    /// 0 active, 1 at risk, 2 disengaged.
    pub fn member_states(&self, group: usize) -> Vec<u32> {
        self.member_buffer(group, |m| [m.state.as_u32()])
    }

    pub fn member_primary_dims(&self, group: usize) -> Vec<u32> {
        self.member_buffer(group, |m| [m.primary_dim() as u32])
    }

    /// `col, row, catalog id` per arranged topic.
    pub fn topic_layout(&self, group: usize) -> Vec<u32> {
        self.world
            .group(group)
            .map(|g| {
                g.topics()
                    .iter()
                    .flat_map(|t| [t.col as u32, t.row as u32, t.id as u32])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn topic_heat(&self, group: usize) -> Vec<f32> {
        self.world
            .group(group)
            .map(|g| g.topics().iter().map(Topic::heat).collect())
            .unwrap_or_default()
    }

    pub fn current_topic_name(&self, group: usize) -> Option<String> {
        self.world
            .group(group)
            .map(|g| g.current_topic().name.clone())
    }
}

impl Sim {
    pub fn world(&self) -> &World {
        &self.world
    }

    fn group(&self, id: usize) -> Result<&Group, JsError> {
        self.world
            .group(id)
            .ok_or_else(|| JsError::new(&format!("no group with id {id}")))
    }

    fn member_buffer<T, const N: usize, F>(&self, group: usize, pick: F) -> Vec<T>
    where
        F: Fn(&Member) -> [T; N],
    {
        self.world
            .group(group)
            .map(|g| g.members().iter().flat_map(&pick).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{catalog_from_flat, Sim};
    use crate::error::GroupError;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("rec.topic{i}")).collect()
    }

    fn vectors(n: usize, dims: usize) -> Vec<f32> {
        (0..n * dims)
            .map(|i| if i % dims == (i / dims) % dims { 0.7 } else { 0.05 })
            .collect()
    }

    #[test]
    fn flat_catalog_splits_by_dimension() {
        let catalog = catalog_from_flat(names(3), &vectors(3, 4), 4).expect("catalog");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[1].vector, vec![0.05, 0.7, 0.05, 0.05]);
        assert_eq!(catalog[2].name, "rec.topic2");
    }

    #[test]
    fn flat_catalog_rejects_ragged_buffer() {
        assert_eq!(
            catalog_from_flat(names(3), &[0.1; 7], 2).err(),
            Some(GroupError::CatalogShape {
                names: 3,
                values: 7,
                dims: 2
            })
        );
        assert_eq!(
            catalog_from_flat(names(1), &[], 0).err(),
            Some(GroupError::ZeroDimensions)
        );
    }

    #[test]
    fn sim_exposes_member_buffers() {
        let mut sim = Sim::new(640.0, 320.0, names(20), vectors(20, 20), 20, Some(42))
            .unwrap_or_else(|_| panic!("sim should build"));
        sim.step_frames(30);

        assert_eq!(sim.group_count(), 4);
        assert_eq!(sim.member_positions(0).len(), 20);
        assert_eq!(sim.member_states(3).len(), 10);
        assert_eq!(sim.topic_layout(0).len(), 60);
        assert_eq!(sim.topic_heat(1).len(), 20);
        assert!(sim.member_positions(9).is_empty());
        assert!(sim.current_topic_name(0).is_some());
    }
}
