use rand::Rng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use tracing::info;

use crate::config::SimParams;
use crate::error::GroupError;
use crate::group::Group;
use crate::math::Rect;
use crate::rng::{create_rng, derive_group_rng};
use crate::snapshot::GroupStats;
use crate::topic::TopicEntry;

pub const CANVAS_PADDING: f32 = 4.0;
pub const GROUP_GAP: f32 = 4.0;
pub const MULTI_GROUP_COUNT: usize = 4;

/// Totals across every group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub active: usize,
    pub at_risk: usize,
    pub disengaged: usize,
    pub halted_groups: usize,
    pub topic_changes: u64,
}

/// Viewport of each group on a `width x height` canvas.
pub fn layout_groups(width: f32, height: f32, single_group: bool) -> Vec<Rect> {
    if single_group {
        return vec![Rect::new(
            CANVAS_PADDING,
            CANVAS_PADDING,
            width - CANVAS_PADDING * 2.0,
            height - CANVAS_PADDING * 2.0,
        )];
    }

    let gw = (width - CANVAS_PADDING * 2.0 - GROUP_GAP) / 2.0;
    let gh = (height - CANVAS_PADDING * 2.0 - GROUP_GAP) / 2.0;
    (0..MULTI_GROUP_COUNT)
        .map(|i| {
            let x = CANVAS_PADDING + (i % 2) as f32 * (gw + GROUP_GAP);
            let y = CANVAS_PADDING + (i / 2) as f32 * (gh + GROUP_GAP);
            Rect::new(x, y, gw, gh)
        })
        .collect()
}

/// All groups on one canvas. Groups share nothing, so stepping order is irrelevant.
pub struct World {
    params: SimParams,
    width: f32,
    height: f32,
    catalog: Vec<TopicEntry>,
    groups: Vec<Group>,
    seed_source: ChaCha12Rng,
    generation: u64,
    topic_changes: u64,
}

impl World {
    pub fn new(
        mut params: SimParams,
        width: f32,
        height: f32,
        catalog: Vec<TopicEntry>,
        seed: u64,
    ) -> Result<Self, GroupError> {
        params.sanitize();
        let mut seed_source = create_rng(seed);
        let groups = build_groups(&params, width, height, &catalog, seed_source.random())?;

        info!(
            groups = groups.len(),
            topics = catalog.len(),
            single_group = params.single_group_mode,
            seed,
            "world initialised"
        );

        Ok(Self {
            params,
            width,
            height,
            catalog,
            groups,
            seed_source,
            generation: 0,
            topic_changes: 0,
        })
    }

    /// Steps every group once unless paused.
    pub fn step(&mut self) {
        if self.params.paused {
            return;
        }
        for group in &mut self.groups {
            let outcome = group.step(&self.params);
            if outcome.topic_changed {
                self.topic_changes += 1;
            }
        }
    }

    /// Rebuilds every group with freshly sampled members.
    pub fn reset(&mut self) -> Result<(), GroupError> {
        let base = self.seed_source.random();
        self.groups = build_groups(&self.params, self.width, self.height, &self.catalog, base)?;
        self.generation += 1;
        self.topic_changes = 0;
        info!(generation = self.generation, "world reset");
        Ok(())
    }

    /// Replaces the parameter set between frames. A mode or grid change rebuilds the groups.
    pub fn set_params(&mut self, mut params: SimParams) -> Result<(), GroupError> {
        params.sanitize();
        let rebuild = params.single_group_mode != self.params.single_group_mode
            || params.grid_cols != self.params.grid_cols
            || params.grid_rows != self.params.grid_rows
            || params.group_size != self.params.group_size
            || params.history_capacity != self.params.history_capacity;
        let previous = std::mem::replace(&mut self.params, params);
        if rebuild {
            if let Err(err) = self.reset() {
                self.params = previous;
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.params.paused = paused;
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: usize) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn group_stats(&self) -> Vec<GroupStats> {
        self.groups.iter().map(Group::stats).collect()
    }

    pub fn stats(&self) -> WorldStats {
        self.groups.iter().fold(
            WorldStats {
                topic_changes: self.topic_changes,
                ..WorldStats::default()
            },
            |mut acc, group| {
                let s = group.stats();
                acc.active += s.active;
                acc.at_risk += s.at_risk;
                acc.disengaged += s.disengaged;
                acc.halted_groups += usize::from(s.halted);
                acc
            },
        )
    }
}

fn build_groups(
    params: &SimParams,
    width: f32,
    height: f32,
    catalog: &[TopicEntry],
    base_seed: u64,
) -> Result<Vec<Group>, GroupError> {
    layout_groups(width, height, params.single_group_mode)
        .into_iter()
        .enumerate()
        .map(|(id, bounds)| {
            let mut rng = derive_group_rng(base_seed, id);
            Group::new(id, bounds, catalog, params, &mut rng)
        })
        .collect()
}
