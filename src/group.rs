//! One conversation group and its per-frame clock.
//!
//! Frame order for a running group:
//! 1. cool every topic;
//! 2. every `check_frequency` frames: refresh interests, run the engagement
//!    check, then rescue steering (which may halt the group or pick a target);
//! 3. compute all member accelerations against a frozen view, then integrate;
//! 4. recompute centroid and momentum from active members, then add the
//!    capped rescue step toward the target tile to momentum;
//! 5. resolve the tile under the centroid and record a snapshot on entry.
//!
//! A halted group only cools its topics. A paused step changes nothing.
//! Parameters are sanitised on the way in, so callers may pass raw values.

use std::f32::consts::TAU;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{ModeParams, SimParams};
use crate::engagement::{self, EngagementRule};
use crate::error::GroupError;
use crate::flocking::{ExternalForces, FlockingField};
use crate::history::{InterestHistory, InterestSample, InterestSnapshot};
use crate::interest::InterestProfile;
use crate::layout::{arrange, TileGrid};
use crate::math::{Rect, Vec2};
use crate::member::{Member, MemberId};
use crate::neighbor_grid::NeighborGrid;
use crate::rescue::{plan_rescue, rescue_nudge, HaltReason, RescueOutcome, RescueParams};
use crate::snapshot::{count_states, GroupStats, MemberView};
use crate::steering::interest_pull;
use crate::topic::{Topic, TopicEntry};

pub const SPAWN_JITTER: f32 = 50.0;
pub const SPAWN_SPEED: f32 = 0.2;
pub const MOMENTUM_SMOOTHING: f32 = 0.15;

/// What happened during one call to [`Group::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub stepped: bool,
    pub checked: bool,
    pub topic_changed: bool,
    /// Topic chosen by rescue steering during this step's check.
    pub rescued: Option<usize>,
    pub halted: Option<HaltReason>,
}

pub struct Group {
    id: usize,
    bounds: Rect,
    mode: ModeParams,
    tiles: TileGrid,
    members: Vec<Member>,
    topics: Vec<Topic>,
    current_topic: usize,
    centroid: Vec2,
    momentum: Vec2,
    halted: Option<HaltReason>,
    rescue_target: Option<usize>,
    frame: u64,
    last_check: u64,
    history: InterestHistory,
    neighbor_grid: NeighborGrid,
    positions: Vec<Vec2>,
}

impl Group {
    /// Builds a group from a topic catalog. Fails without creating anything on bad input.
    ///
    /// Structural checks run on `params` as given; everything after runs on a
    /// sanitised copy.
    pub fn new<R: Rng + ?Sized>(
        id: usize,
        bounds: Rect,
        catalog: &[TopicEntry],
        params: &SimParams,
        rng: &mut R,
    ) -> Result<Self, GroupError> {
        let dims = validate(bounds, catalog, params)?;
        let params = &params.sanitized();
        let mode = params.mode();
        let tiles = TileGrid::new(bounds, params.grid_cols, params.grid_rows);

        let vectors: Vec<&[f32]> = catalog.iter().map(|e| e.vector.as_slice()).collect();
        let placements = arrange(&vectors, params.grid_cols, params.grid_rows);
        if placements.len() < catalog.len() {
            return Err(GroupError::GridTooSmall {
                cells: params.grid_cols * params.grid_rows,
                topics: catalog.len(),
            });
        }
        let topics: Vec<Topic> = placements
            .iter()
            .map(|p| {
                Topic::from_entry(
                    p.index,
                    &catalog[p.index],
                    p.col,
                    p.row,
                    params.topic_jitter,
                    &mut *rng,
                )
            })
            .collect();

        let center = bounds.center();
        let members: Vec<Member> = (0..params.group_size)
            .map(|local| {
                let interests = InterestProfile::generate(&mut *rng, dims);
                let offset = Vec2::new(
                    rng.random_range(-0.5..0.5) * SPAWN_JITTER,
                    rng.random_range(-0.5..0.5) * SPAWN_JITTER,
                );
                let heading = Vec2::from_angle(rng.random_range(0.0..TAU));
                Member::new(
                    MemberId { group: id, local },
                    interests,
                    bounds.clamp_inset(center + offset, mode.bounds_inset),
                    heading * SPAWN_SPEED,
                    mode.max_speed,
                    mode.max_force,
                )
            })
            .collect();

        let current_topic = tiles
            .cell_at(center)
            .and_then(|cell| find_topic_at(&topics, cell))
            .unwrap_or(0);

        let mut group = Self {
            id,
            bounds,
            mode,
            tiles,
            neighbor_grid: NeighborGrid::new(members.len(), bounds, mode.query_radius()),
            positions: Vec::with_capacity(members.len()),
            members,
            topics,
            current_topic,
            centroid: center,
            momentum: Vec2::ZERO,
            halted: None,
            rescue_target: None,
            frame: 0,
            last_check: 0,
            history: InterestHistory::new(params.history_capacity),
        };

        group.topics[current_topic].on_enter();
        group.refresh_interests(params);
        group.record_snapshot();

        info!(
            group = id,
            members = group.members.len(),
            topics = group.topics.len(),
            dims,
            start_topic = %group.topics[current_topic].name,
            "group initialised"
        );
        Ok(group)
    }

    /// Advances the group by one frame.
    pub fn step(&mut self, params: &SimParams) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let params = &params.sanitized();
        if params.paused {
            return outcome;
        }

        for topic in &mut self.topics {
            topic.cool_down(params.heat_decay_rate);
        }
        if self.halted.is_some() {
            outcome.halted = self.halted;
            return outcome;
        }

        outcome.stepped = true;
        self.frame += 1;
        if self.frame - self.last_check >= u64::from(params.check_frequency) {
            outcome.rescued = self.run_check(params);
            self.last_check = self.frame;
            outcome.checked = true;
        }
        if self.halted.is_some() {
            outcome.halted = self.halted;
            return outcome;
        }

        self.move_members(params);
        self.update_centroid();
        self.pull_toward_rescue_target(params.rescue_step);
        outcome.topic_changed = self.update_current_topic(params);
        if self.rescue_target == Some(self.current_topic) {
            self.rescue_target = None;
        }
        outcome
    }

    /// Returns the rescue target picked by this check, if any.
    fn run_check(&mut self, params: &SimParams) -> Option<usize> {
        self.refresh_interests(params);
        engagement::update_states(
            &mut self.members,
            EngagementRule {
                recovery_threshold: params.recovery_threshold,
                disengage_after_checks: params.disengage_after_checks,
            },
        );

        let engaged = self
            .members
            .iter()
            .filter(|m| !m.state.is_disengaged())
            .count();
        if params.min_active_members > 0 && engaged < params.min_active_members {
            self.halt(HaltReason::TooFewActive);
            return None;
        }

        let outcome = plan_rescue(
            &self.members,
            &self.topics,
            self.current_topic,
            RescueParams {
                neighbor_topics_threshold: params.neighbor_topics_threshold,
                recovery_threshold: params.recovery_threshold,
                max_interest: params.max_interest,
            },
        );
        match outcome {
            RescueOutcome::Idle => self.rescue_target = None,
            RescueOutcome::Steered { topic } => {
                debug!(
                    group = self.id,
                    target = %self.topics[topic].name,
                    "rescue steering toward topic"
                );
                self.rescue_target = Some(topic);
            }
            RescueOutcome::Halted(reason) => self.halt(reason),
        }
        self.rescue_target
    }

    /// Adds the capped step from the centroid to the target tile into momentum,
    /// which every engaged member feels on the next frame.
    fn pull_toward_rescue_target(&mut self, max_step: f32) {
        let Some(topic) = self.rescue_target else {
            return;
        };
        let target = self.tile_center(topic);
        self.momentum += rescue_nudge(self.centroid, target, max_step);
        self.cap_momentum();
    }

    fn cap_momentum(&mut self) {
        if self.momentum.length() > 1.0 {
            self.momentum = self.momentum.normalized();
        }
    }

    fn halt(&mut self, reason: HaltReason) {
        warn!(
            group = self.id,
            frame = self.frame,
            topic = %self.topics[self.current_topic].name,
            ?reason,
            "group halted"
        );
        self.halted = Some(reason);
        self.rescue_target = None;
    }

    fn move_members(&mut self, params: &SimParams) {
        self.positions.clear();
        self.positions.extend(self.members.iter().map(|m| m.position));
        self.neighbor_grid.rebuild(&self.positions);

        let accelerations: Vec<Vec2> = {
            let field =
                FlockingField::new(&self.members, &self.neighbor_grid, self.mode, self.bounds);
            self.members
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    if m.state.is_disengaged() {
                        return Vec2::ZERO;
                    }
                    let external = ExternalForces {
                        interest_pull: interest_pull(m, &self.topics, &self.tiles),
                        momentum: self.momentum,
                    };
                    field.acceleration(i, external, params)
                })
                .collect()
        };

        for (member, acceleration) in self.members.iter_mut().zip(accelerations) {
            member.apply_force(acceleration);
            member.integrate(params.max_velocity, &self.bounds, self.mode.bounds_inset);
        }
    }

    fn update_centroid(&mut self) {
        let (sum, count) = self
            .members
            .iter()
            .filter(|m| m.state == engagement::Engagement::Active)
            .fold((Vec2::ZERO, 0usize), |(sum, count), m| (sum + m.position, count + 1));
        if count == 0 {
            return;
        }

        let previous = self.centroid;
        self.centroid = sum / count as f32;
        let delta = self.centroid - previous;
        self.momentum = self.momentum.lerp(delta, MOMENTUM_SMOOTHING);
        self.cap_momentum();
    }

    fn update_current_topic(&mut self, params: &SimParams) -> bool {
        let Some(next) = self
            .tiles
            .cell_at(self.centroid)
            .and_then(|cell| find_topic_at(&self.topics, cell))
        else {
            return false;
        };
        if next == self.current_topic {
            return false;
        }

        debug!(
            group = self.id,
            from = %self.topics[self.current_topic].name,
            to = %self.topics[next].name,
            frame = self.frame,
            "topic changed"
        );
        self.current_topic = next;
        self.topics[next].on_enter();
        self.refresh_interests(params);
        self.record_snapshot();
        true
    }

    fn refresh_interests(&mut self, params: &SimParams) {
        let vector = self.topics[self.current_topic].vector();
        for member in &mut self.members {
            member.refresh_interest(vector, params.max_interest, params.max_velocity);
        }
    }

    fn record_snapshot(&mut self) {
        let samples = self
            .members
            .iter()
            .map(|m| InterestSample {
                interest: m.current_interest,
                state: m.state,
            })
            .collect();
        self.history.push(InterestSnapshot {
            frame: self.frame,
            topic: self.topics[self.current_topic].id,
            samples,
        });
    }

    pub fn tile_center(&self, topic: usize) -> Vec2 {
        let t = &self.topics[topic];
        self.tiles.tile_center(t.col, t.row)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn mode(&self) -> ModeParams {
        self.mode
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn current_topic_index(&self) -> usize {
        self.current_topic
    }

    pub fn current_topic(&self) -> &Topic {
        &self.topics[self.current_topic]
    }

    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    pub fn momentum(&self) -> Vec2 {
        self.momentum
    }

    /// Topic the group is currently being steered toward.
    pub fn rescue_target(&self) -> Option<usize> {
        self.rescue_target
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn history(&self) -> &InterestHistory {
        &self.history
    }

    pub fn group_velocity(&self) -> f32 {
        engagement::group_velocity(&self.members)
    }

    pub fn stats(&self) -> GroupStats {
        let (active, at_risk, disengaged) = count_states(&self.members);
        let topic = self.current_topic();
        GroupStats {
            group: self.id,
            active,
            at_risk,
            disengaged,
            current_topic: topic.id,
            current_topic_name: topic.name.clone(),
            group_velocity: self.group_velocity(),
            halted: self.is_halted(),
            halt_reason: self.halted,
            frame: self.frame,
        }
    }

    pub fn member_views(&self) -> Vec<MemberView> {
        self.members.iter().map(MemberView::from).collect()
    }
}

fn find_topic_at(topics: &[Topic], (col, row): (usize, usize)) -> Option<usize> {
    topics.iter().position(|t| t.col == col && t.row == row)
}

fn validate(bounds: Rect, catalog: &[TopicEntry], params: &SimParams) -> Result<usize, GroupError> {
    if !bounds.is_valid() {
        return Err(GroupError::InvalidBounds);
    }
    if params.group_size == 0 {
        return Err(GroupError::EmptyGroup);
    }
    let first = catalog.first().ok_or(GroupError::EmptyCatalog)?;
    let dims = first.vector.len();
    if dims == 0 {
        return Err(GroupError::ZeroDimensions);
    }
    if let Some((topic, entry)) = catalog
        .iter()
        .enumerate()
        .find(|(_, e)| e.vector.len() != dims)
    {
        return Err(GroupError::DimensionMismatch {
            topic,
            expected: dims,
            actual: entry.vector.len(),
        });
    }
    let cells = params.grid_cols * params.grid_rows;
    if cells < catalog.len() {
        return Err(GroupError::GridTooSmall {
            cells,
            topics: catalog.len(),
        });
    }
    Ok(dims)
}
