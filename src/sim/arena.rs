//! One self-contained air hockey table
//!
//! An arena owns its puck, both pushers, their cached start poses, its
//! scoreboard and goal triggers. Nothing in here can reach another arena:
//! every position is arena-local and `step` only borrows `self`.
//!
//! Step order:
//! 1. collect actions from both decision sources (plus shaping and step limit)
//! 2. integrate motion
//! 3. resolve contacts and clamp pushers
//! 4. evaluate goal triggers
//! 5. apply a pending reset, if any
//!
//! Reset requests raised during a step are coalesced and only applied at
//! step 5, so no part of a step ever sees a half-reset table.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::RigidBody;
use super::clamp::AxisRange;
use super::collision::{
    circle_circle_contact, collide_absorbing, collide_elastic, resolve_floor_contact,
    resolve_wall_bounce,
};
use super::events::{
    ArenaId, ArenaSnapshot, BodySnapshot, GameEvent, PusherSnapshot, ResetReason,
};
use super::goal::GoalTrigger;
use super::policy::{Policy, PolicyHandle, Transition};
use super::pusher::{DecisionSource, Pusher, ScriptedController, Side};
use super::score::ScoreTracker;
use super::table::Table;
use crate::error::ArenaError;
use crate::settings::SimSettings;

/// Start poses captured once when the arena is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPoses {
    pub puck: Vec3,
    pub near: Vec3,
    pub far: Vec3,
}

impl StartPoses {
    pub fn pusher(&self, side: Side) -> Vec3 {
        match side {
            Side::Near => self.near,
            Side::Far => self.far,
        }
    }
}

/// Everything one step produced
#[derive(Debug, Clone, Default)]
pub struct ArenaStepReport {
    pub arena: ArenaId,
    /// Feedback for each policy-driven pusher that took part in the step
    pub transitions: Vec<Transition>,
    pub events: Vec<GameEvent>,
    /// Reset applied at the end of this step
    pub reset: Option<ResetReason>,
}

/// Explicit wiring for an arena
///
/// Bodies are handed over directly; a missing or duplicated one is a
/// configuration error reported by [`ArenaBuilder::build`].
pub struct ArenaBuilder<'a> {
    id: ArenaId,
    origin: Vec3,
    settings: &'a SimSettings,
    puck: Option<RigidBody>,
    near: Option<RigidBody>,
    far: Option<RigidBody>,
    duplicate: Option<Side>,
}

impl<'a> ArenaBuilder<'a> {
    pub fn new(id: ArenaId, origin: Vec3, settings: &'a SimSettings) -> Self {
        Self {
            id,
            origin,
            settings,
            puck: None,
            near: None,
            far: None,
            duplicate: None,
        }
    }

    /// Builder pre-wired with the puck and pushers described by `settings`
    pub fn from_settings(id: ArenaId, origin: Vec3, settings: &'a SimSettings) -> Self {
        let physics = &settings.physics;
        let table = &settings.table;
        let pusher_body = |pos| RigidBody::new(pos, physics.pusher_mass, physics.pusher_radius);
        Self::new(id, origin, settings)
            .puck(RigidBody::new(table.puck_start, physics.puck_mass, physics.puck_radius))
            .pusher(Side::Near, pusher_body(table.near_start))
            .pusher(Side::Far, pusher_body(table.far_start))
    }

    pub fn puck(mut self, body: RigidBody) -> Self {
        self.puck = Some(body);
        self
    }

    pub fn pusher(mut self, side: Side, body: RigidBody) -> Self {
        let slot = match side {
            Side::Near => &mut self.near,
            Side::Far => &mut self.far,
        };
        if slot.replace(body).is_some() {
            self.duplicate = Some(side);
        }
        self
    }

    pub fn build(self) -> Result<Arena, ArenaError> {
        self.settings.validate()?;
        if let Some(side) = self.duplicate {
            return Err(ArenaError::DuplicateSide(side));
        }
        let puck = self.puck.ok_or(ArenaError::MissingPuck)?;
        let near = self.near.ok_or(ArenaError::MissingPusher(Side::Near))?;
        let far = self.far.ok_or(ArenaError::MissingPusher(Side::Far))?;
        puck.validate("puck")?;

        let table = Table::new(&self.settings.table);
        let puck_x = AxisRange::new(-table.half_length, table.half_length);
        check_start("puck", &puck, puck_x, table.z_range(puck.radius))?;

        let make_pusher = |side: Side, body: RigidBody| -> Result<Pusher, ArenaError> {
            let x_range = table.pusher_x_range(side);
            let z_range = table.z_range(body.radius);
            let name = match side {
                Side::Near => "near pusher",
                Side::Far => "far pusher",
            };
            check_start(name, &body, x_range, z_range)?;
            Pusher::new(side, body, x_range, z_range)
        };
        let pushers = [make_pusher(Side::Near, near)?, make_pusher(Side::Far, far)?];

        let start = StartPoses {
            puck: puck.pos,
            near: near.pos,
            far: far.pos,
        };
        let goals = Side::BOTH
            .iter()
            .map(|&defender| GoalTrigger::for_defender(&table, defender))
            .collect();

        let mut arena = Arena {
            id: self.id,
            origin: self.origin,
            settings: self.settings.clone(),
            table,
            puck,
            pushers,
            start,
            score: ScoreTracker::new(self.settings.episode.win_threshold),
            goals,
            rng: Pcg32::seed_from_u64(arena_seed(self.settings.seed, self.id)),
            pending_reset: None,
            zero_scores_on_reset: false,
            episodes: 0,
            events: Vec::new(),
        };
        // First episode starts from a clean table with freshly rolled modes
        arena.apply_reset();
        Ok(arena)
    }
}

/// Start poses are reapplied on every reset, so they must lie inside the ranges
fn check_start(
    body: &'static str,
    rb: &RigidBody,
    x_range: AxisRange,
    z_range: AxisRange,
) -> Result<(), ArenaError> {
    if x_range.contains(rb.pos.x) && z_range.contains(rb.pos.z) {
        Ok(())
    } else {
        Err(ArenaError::StartOutOfRange {
            body,
            x: rb.pos.x,
            z: rb.pos.z,
        })
    }
}

/// Per-arena RNG stream derived from the pool seed
pub fn arena_seed(seed: u64, id: ArenaId) -> u64 {
    seed ^ (id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Debug, Clone)]
pub struct Arena {
    id: ArenaId,
    /// World-space placement of the local frame
    origin: Vec3,
    settings: SimSettings,
    table: Table,
    puck: RigidBody,
    /// Indexed by `Side::index`
    pushers: [Pusher; 2],
    start: StartPoses,
    score: ScoreTracker,
    goals: Vec<GoalTrigger>,
    rng: Pcg32,
    pending_reset: Option<ResetReason>,
    zero_scores_on_reset: bool,
    /// Completed episodes
    episodes: u64,
    events: Vec<GameEvent>,
}

impl Arena {
    /// Build an arena from settings alone
    pub fn new(id: ArenaId, origin: Vec3, settings: &SimSettings) -> Result<Self, ArenaError> {
        ArenaBuilder::from_settings(id, origin, settings).build()
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.origin + local
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn puck(&self) -> &RigidBody {
        &self.puck
    }

    pub fn puck_mut(&mut self) -> &mut RigidBody {
        &mut self.puck
    }

    pub fn pusher(&self, side: Side) -> &Pusher {
        &self.pushers[side.index()]
    }

    pub fn pusher_mut(&mut self, side: Side) -> &mut Pusher {
        &mut self.pushers[side.index()]
    }

    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn start_poses(&self) -> &StartPoses {
        &self.start
    }

    pub fn pending_reset(&self) -> Option<ResetReason> {
        self.pending_reset
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Queue a reset for the end of the current step
    ///
    /// A request while one is already pending is a silent no-op; returns
    /// whether this call queued a new reset.
    pub fn request_reset(&mut self, reason: ResetReason) -> bool {
        if self.pending_reset.is_some() {
            log::debug!("arena {}: reset already pending, {:?} coalesced", self.id, reason);
            return false;
        }
        self.pending_reset = Some(reason);
        true
    }

    /// Reset right now, between steps
    ///
    /// Drops any queued request: the table is already at its episode start.
    /// Pushers still mid-episode get a closing `done` transition in the
    /// returned report.
    pub fn reset_arena(&mut self) -> ArenaStepReport {
        let transitions = self.pushers.iter_mut().filter_map(Pusher::end_episode).collect();
        self.pending_reset = None;
        self.apply_reset();
        self.episodes += 1;
        self.events.push(GameEvent::EpisodeReset {
            reason: ResetReason::External,
        });

        ArenaStepReport {
            arena: self.id,
            transitions,
            events: std::mem::take(&mut self.events),
            reset: Some(ResetReason::External),
        }
    }

    /// Advance one fixed step
    pub fn step(&mut self, policy: &dyn Policy) -> ArenaStepReport {
        self.collect_actions(policy);
        self.integrate();
        self.resolve_contacts();
        self.check_goals();

        // Every episode the reset closes ends with this step
        if self.pending_reset.is_some() {
            for pusher in &mut self.pushers {
                pusher.terminate();
            }
        }
        let transitions = self.pushers.iter().filter_map(Pusher::transition).collect();
        let reset = self.pending_reset.take();
        if let Some(reason) = reset {
            self.apply_reset();
            self.episodes += 1;
            self.events.push(GameEvent::EpisodeReset { reason });
        }

        ArenaStepReport {
            arena: self.id,
            transitions,
            events: std::mem::take(&mut self.events),
            reset,
        }
    }

    fn collect_actions(&mut self, policy: &dyn Policy) {
        for pusher in &mut self.pushers {
            pusher.begin_step();
        }

        // Both sides observe the same pre-action state
        let [near, far] = &self.pushers;
        let observations = [
            near.observe(Some(&far.body), &self.puck, &self.settings.pusher),
            far.observe(Some(&near.body), &self.puck, &self.settings.pusher),
        ];

        let puck_pos = self.puck.pos;
        let dt = self.settings.physics.dt;
        let rewards = &self.settings.rewards;
        for (pusher, observation) in self.pushers.iter_mut().zip(observations) {
            let dir = pusher.decide_action(observation, puck_pos, policy);
            pusher.apply_action(dir, &self.settings.pusher, dt);

            if pusher.is_active() {
                pusher.add_reward(rewards.existence_penalty);
                if self.table.half_of(puck_pos.x) == Some(pusher.side) {
                    pusher.add_reward(rewards.puck_own_half);
                } else {
                    pusher.add_reward(rewards.puck_opponent_half);
                }
            }
        }

        let max_steps = self.settings.episode.max_steps;
        for side in Side::BOTH {
            let pusher = &self.pushers[side.index()];
            if pusher.is_active() && pusher.reached_step_limit(max_steps) {
                self.end_by_step_limit();
            }
        }
    }

    /// Penalize and close both episodes, then ask for a single reset
    fn end_by_step_limit(&mut self) {
        let penalty = self.settings.rewards.step_limit_penalty;
        for pusher in &mut self.pushers {
            pusher.add_reward(penalty);
            pusher.terminate();
        }
        self.request_reset(ResetReason::StepLimit);
    }

    fn integrate(&mut self) {
        let dt = self.settings.physics.dt;
        for pusher in &mut self.pushers {
            pusher.body.integrate(dt);
        }

        let max_speed = self.settings.physics.max_puck_speed;
        let vel = resolve_floor_contact(self.puck.vel).clamp_length_max(max_speed);
        self.puck.set_velocity(vel);
        self.puck.integrate(dt);
    }

    fn resolve_contacts(&mut self) {
        self.resolve_pusher_contact();
        for pusher in &mut self.pushers {
            pusher.constrain();
        }

        for side in Side::BOTH {
            self.resolve_strike(side);
        }
        self.resolve_walls();
    }

    /// Pushers can only meet at the centre line; plain elastic exchange
    fn resolve_pusher_contact(&mut self) {
        let [near, far] = &mut self.pushers;
        let contact =
            circle_circle_contact(near.body.pos, near.body.radius, far.body.pos, far.body.radius);
        if !contact.hit {
            return;
        }

        let n = contact.normal;
        near.body.pos -= n * (contact.penetration * 0.5);
        far.body.pos += n * (contact.penetration * 0.5);
        let approaching = (far.body.vel - near.body.vel).dot(n) < 0.0;
        if approaching {
            collide_elastic(&mut near.body, &mut far.body, n);
        }
    }

    /// Pusher against puck: absorbing response on contact entry, separation always
    fn resolve_strike(&mut self, side: Side) {
        let pusher = &self.pushers[side.index()];
        let contact = circle_circle_contact(
            pusher.body.pos,
            pusher.body.radius,
            self.puck.pos,
            self.puck.radius,
        );
        let entered = contact.hit && !pusher.touching_puck;
        self.pushers[side.index()].touching_puck = contact.hit;
        if !contact.hit {
            return;
        }

        self.puck.pos += contact.normal * contact.penetration;
        if !entered {
            return;
        }

        collide_absorbing(&mut self.puck, &self.pushers[side.index()].body, contact.normal);
        self.events.push(GameEvent::PuckStrike { side });

        let rewards = &self.settings.rewards;
        let (touch, opponent_touch) = (rewards.puck_touch, rewards.opponent_touch);
        self.pushers[side.index()].add_reward(touch);
        self.pushers[side.opponent().index()].add_reward(opponent_touch);
    }

    fn resolve_walls(&mut self) {
        let physics = &self.settings.physics;
        for wall in &self.table.walls {
            let contact = wall.contact(self.puck.pos, self.puck.radius);
            if !contact.hit {
                continue;
            }
            self.puck.pos += contact.normal * contact.penetration;
            // Already leaving the wall: nothing to bounce
            if self.puck.vel.dot(contact.normal) <= 0.0 {
                let vel = resolve_wall_bounce(
                    self.puck.vel,
                    contact.normal,
                    physics.wall_bounce_kick,
                    physics.unstick_speed,
                );
                self.puck.set_velocity(vel);
            }
        }
    }

    fn check_goals(&mut self) {
        let puck_pos = self.puck.pos;
        let scorers: Vec<Side> = self
            .goals
            .iter_mut()
            .filter_map(|goal| goal.check(puck_pos))
            .collect();

        for scorer in scorers {
            self.on_goal(scorer);
        }
    }

    fn on_goal(&mut self, scorer: Side) {
        let won = self.score.add_score(scorer);
        self.events.push(GameEvent::Goal {
            scorer,
            near: self.score.score(Side::Near),
            far: self.score.score(Side::Far),
        });
        log::debug!(
            "arena {}: {} scores ({}-{})",
            self.id,
            scorer.player_label(),
            self.score.score(Side::Near),
            self.score.score(Side::Far)
        );

        let rewards = &self.settings.rewards;
        let (scored, conceded) = (rewards.goal_scored, rewards.goal_conceded);
        for pusher in &mut self.pushers {
            pusher.add_reward(if pusher.side == scorer { scored } else { conceded });
            pusher.terminate();
        }

        if won {
            self.zero_scores_on_reset = true;
            self.events.push(GameEvent::MatchWon { winner: scorer });
            log::info!("arena {}: {} wins the match", self.id, scorer.player_label());
        }
        self.request_reset(ResetReason::Goal);
    }

    /// Teleport everything home, re-roll both modes, settle the scoreboard
    fn apply_reset(&mut self) {
        self.puck.teleport(self.start.puck);
        for side in Side::BOTH {
            let source = self.roll_source(side);
            let start = self.start.pusher(side);
            let pusher = &mut self.pushers[side.index()];
            pusher.reset_episode(start);
            pusher.set_source(source);
        }
        for goal in &mut self.goals {
            goal.clear();
        }

        if self.zero_scores_on_reset {
            self.score.reset();
            self.zero_scores_on_reset = false;
        }
    }

    fn roll_source(&mut self, side: Side) -> DecisionSource {
        let roll: f32 = self.rng.random();
        if roll < self.settings.episode.policy_probability {
            DecisionSource::Policy(PolicyHandle::for_side(side))
        } else {
            let deadzone = self.settings.pusher.scripted_deadzone;
            DecisionSource::Scripted(ScriptedController::new(deadzone))
        }
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        let body = |b: &RigidBody| BodySnapshot {
            local: b.pos,
            world: self.to_world(b.pos),
            vel: b.vel,
        };
        let pusher = |side: Side| {
            let p = self.pusher(side);
            PusherSnapshot {
                side,
                body: body(&p.body),
                mode: p.mode(),
                phase: p.phase,
                steps: p.steps,
                episode_reward: p.episode_reward(),
            }
        };
        ArenaSnapshot {
            arena: self.id,
            origin: self.origin,
            puck: body(&self.puck),
            pushers: [pusher(Side::Near), pusher(Side::Far)],
            score_near: self.score.score(Side::Near),
            score_far: self.score.score(Side::Far),
            episodes: self.episodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::policy::{ChasePuckPolicy, Direction, IdlePolicy, Observation};
    use crate::sim::pusher::{ControlMode, PusherPhase};

    fn settings() -> SimSettings {
        SimSettings::training()
    }

    fn arena(settings: &SimSettings) -> Arena {
        Arena::new(0, Vec3::ZERO, settings).unwrap()
    }

    fn body(x: f32) -> RigidBody {
        RigidBody::new(Vec3::new(x, 0.0, 0.0), 1.0, 0.15)
    }

    fn count_resets(report: &ArenaStepReport) -> usize {
        report
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EpisodeReset { .. }))
            .count()
    }

    #[test]
    fn test_build_requires_puck() {
        let s = settings();
        let err = ArenaBuilder::new(0, Vec3::ZERO, &s)
            .pusher(Side::Near, body(-1.5))
            .pusher(Side::Far, body(1.5))
            .build()
            .unwrap_err();
        assert_eq!(err, ArenaError::MissingPuck);
    }

    #[test]
    fn test_build_requires_both_pushers() {
        let s = settings();
        let err = ArenaBuilder::new(0, Vec3::ZERO, &s)
            .puck(RigidBody::new(Vec3::ZERO, 1.0, 0.1))
            .pusher(Side::Near, body(-1.5))
            .build()
            .unwrap_err();
        assert_eq!(err, ArenaError::MissingPusher(Side::Far));
    }

    #[test]
    fn test_build_rejects_duplicate_side() {
        let s = settings();
        let err = ArenaBuilder::from_settings(0, Vec3::ZERO, &s)
            .pusher(Side::Near, body(-1.0))
            .build()
            .unwrap_err();
        assert_eq!(err, ArenaError::DuplicateSide(Side::Near));
    }

    #[test]
    fn test_build_rejects_massless_puck() {
        let s = settings();
        let err = ArenaBuilder::from_settings(0, Vec3::ZERO, &s)
            .puck(RigidBody::new(Vec3::ZERO, 0.0, 0.1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ArenaError::InvalidMass { body: "puck", .. }));
    }

    #[test]
    fn test_reset_restores_start_poses() {
        let s = settings();
        let mut arena = arena(&s);
        for _ in 0..40 {
            arena.step(&ChasePuckPolicy::default());
        }
        assert!(arena.pusher(Side::Near).body.pos != arena.start_poses().near);

        arena.reset_arena();
        let start = *arena.start_poses();
        assert_eq!(arena.puck().pos, start.puck);
        assert!(arena.puck().is_at_rest());
        for side in Side::BOTH {
            let pusher = arena.pusher(side);
            assert_eq!(pusher.body.pos, start.pusher(side));
            assert!(pusher.body.is_at_rest());
            assert_eq!(pusher.phase, PusherPhase::Reset);
            assert_eq!(pusher.steps, 0);
            assert_eq!(pusher.episode_reward(), 0.0);
        }
    }

    #[test]
    fn test_duplicate_requests_coalesce() {
        let mut s = settings();
        s.episode.policy_probability = 0.5;
        let mut once = arena(&s);
        let mut many = arena(&s);

        assert!(once.request_reset(ResetReason::External));
        assert!(many.request_reset(ResetReason::External));
        for _ in 0..4 {
            assert!(!many.request_reset(ResetReason::StepLimit));
        }
        assert_eq!(many.pending_reset(), Some(ResetReason::External));

        let a = once.step(&IdlePolicy);
        let b = many.step(&IdlePolicy);
        assert_eq!(a.reset, Some(ResetReason::External));
        assert_eq!(b.reset, Some(ResetReason::External));
        assert_eq!(count_resets(&b), 1);
        assert_eq!(once.episodes(), 1);
        assert_eq!(many.episodes(), 1);
        assert_eq!(once.snapshot(), many.snapshot());
        assert_eq!(many.pending_reset(), None);
    }

    #[test]
    fn test_step_limit_ends_both_episodes_once() {
        let mut s = settings();
        s.episode.max_steps = 3;
        let mut arena = arena(&s);

        for _ in 0..2 {
            let report = arena.step(&IdlePolicy);
            assert_eq!(report.reset, None);
            assert!(report.transitions.iter().all(|t| !t.done));
        }

        let report = arena.step(&IdlePolicy);
        assert_eq!(report.reset, Some(ResetReason::StepLimit));
        assert_eq!(count_resets(&report), 1);
        assert_eq!(report.transitions.len(), 2);
        for t in &report.transitions {
            assert!(t.done);
            // Shaping for a centred puck (+0.001) plus the step-limit penalty
            assert!((t.reward - (0.001 - 100.0)).abs() < 1e-3, "reward {}", t.reward);
        }
        assert_eq!(arena.episodes(), 1);
        assert_eq!(arena.pusher(Side::Near).phase, PusherPhase::Reset);
    }

    #[test]
    fn test_unlimited_episode() {
        let mut s = settings();
        s.episode.max_steps = 0;
        let mut arena = arena(&s);
        for _ in 0..100 {
            assert_eq!(arena.step(&IdlePolicy).reset, None);
        }
        assert_eq!(arena.pusher(Side::Far).steps, 100);
    }

    fn shoot_at_far_goal(arena: &mut Arena) {
        let puck = arena.puck_mut();
        puck.pos = Vec3::new(1.99, 0.0, 0.0);
        puck.vel = Vec3::new(2.0, 0.0, 0.0);
    }

    #[test]
    fn test_goal_scores_rewards_and_resets() {
        let s = settings();
        let mut arena = arena(&s);
        shoot_at_far_goal(&mut arena);

        let report = arena.step(&IdlePolicy);
        assert!(report.events.contains(&GameEvent::Goal {
            scorer: Side::Near,
            near: 1,
            far: 0
        }));
        assert_eq!(report.reset, Some(ResetReason::Goal));

        let near = report.transitions.iter().find(|t| t.side == Side::Near).unwrap();
        let far = report.transitions.iter().find(|t| t.side == Side::Far).unwrap();
        assert!(near.done && far.done);
        assert!((near.reward - 1.001).abs() < 1e-4, "near {}", near.reward);
        assert!((far.reward + 1.0025).abs() < 1e-4, "far {}", far.reward);

        assert_eq!(arena.score().score(Side::Near), 1);
        assert_eq!(arena.puck().pos, arena.start_poses().puck);
    }

    #[test]
    fn test_win_zeroes_scores_after_reset() {
        let mut s = settings();
        s.episode.win_threshold = 1;
        let mut arena = arena(&s);
        shoot_at_far_goal(&mut arena);

        let report = arena.step(&IdlePolicy);
        assert!(report.events.contains(&GameEvent::MatchWon { winner: Side::Near }));
        assert_eq!(arena.score().score(Side::Near), 0);
        assert_eq!(arena.score().score(Side::Far), 0);
    }

    #[test]
    fn test_seven_goals_then_zero() {
        let s = settings();
        let mut arena = arena(&s);
        for goal in 1..=7u32 {
            shoot_at_far_goal(&mut arena);
            let report = arena.step(&IdlePolicy);
            if goal < 7 {
                assert_eq!(arena.score().score(Side::Near), goal);
            } else {
                assert!(report.events.contains(&GameEvent::MatchWon { winner: Side::Near }));
            }
        }
        assert_eq!(arena.score().score(Side::Near), 0);
        assert_eq!(arena.episodes(), 7);
    }

    #[test]
    fn test_goal_and_step_limit_share_one_reset() {
        let mut s = settings();
        s.episode.max_steps = 1;
        let mut arena = arena(&s);
        shoot_at_far_goal(&mut arena);

        let report = arena.step(&IdlePolicy);
        assert_eq!(report.reset, Some(ResetReason::StepLimit));
        assert_eq!(count_resets(&report), 1);
        assert_eq!(arena.episodes(), 1);
        // The goal still counts
        assert_eq!(arena.score().score(Side::Near), 1);
    }

    #[test]
    fn test_strike_rewards_are_zero_sum_shaped() {
        let s = settings();
        let mut arena = arena(&s);
        {
            let near = arena.pusher_mut(Side::Near);
            near.body.pos = Vec3::new(-0.2, 0.0, 0.0);
            near.body.vel = Vec3::new(2.0, 0.0, 0.0);
        }

        let push = |_: PolicyHandle, _: &Observation| Direction::PlusX;
        let report = arena.step(&push);

        assert!(report.events.contains(&GameEvent::PuckStrike { side: Side::Near }));
        let near = report.transitions.iter().find(|t| t.side == Side::Near).unwrap();
        let far = report.transitions.iter().find(|t| t.side == Side::Far).unwrap();
        assert!((near.reward - 5.001).abs() < 1e-4, "near {}", near.reward);
        assert!((far.reward + 2.999).abs() < 1e-4, "far {}", far.reward);

        // Puck absorbed the strike; the pusher kept its own velocity
        assert!((arena.puck().vel.x - 5.0).abs() < 1e-4);
        assert!((arena.pusher(Side::Near).body.vel.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_strike_fires_once_per_contact() {
        let s = settings();
        let mut arena = arena(&s);
        arena.pusher_mut(Side::Near).body.pos = Vec3::new(-0.2, 0.0, 0.0);
        arena.puck_mut().vel = Vec3::ZERO;

        let strikes: usize = (0..3)
            .map(|_| {
                arena
                    .step(&IdlePolicy)
                    .events
                    .iter()
                    .filter(|e| matches!(e, GameEvent::PuckStrike { .. }))
                    .count()
            })
            .sum();
        assert_eq!(strikes, 1);
    }

    #[test]
    fn test_bodies_stay_in_range_and_planar() {
        let s = settings();
        let mut arena = arena(&s);
        let policy = ChasePuckPolicy::default();
        for _ in 0..2000 {
            arena.step(&policy);
            for side in Side::BOTH {
                let p = arena.pusher(side);
                assert!(p.x_range.contains(p.body.pos.x), "{side:?} x {}", p.body.pos.x);
                assert!(p.z_range.contains(p.body.pos.z), "{side:?} z {}", p.body.pos.z);
                assert_eq!(p.body.vel.y, 0.0);
            }
            assert_eq!(arena.puck().vel.y, 0.0);
            assert!(arena.puck().pos.z.abs() <= s.table.half_width);
        }
    }

    #[test]
    fn test_mode_roll_follows_probability() {
        let mut s = settings();
        s.episode.policy_probability = 0.0;
        let arena0 = arena(&s);
        assert_eq!(arena0.pusher(Side::Near).mode(), ControlMode::Scripted);
        assert_eq!(arena0.pusher(Side::Far).mode(), ControlMode::Scripted);

        s.episode.policy_probability = 1.0;
        let arena1 = arena(&s);
        assert_eq!(arena1.pusher(Side::Near).mode(), ControlMode::Policy);

        s.episode.policy_probability = 0.5;
        let mut mixed = arena(&s);
        let mut scripted = 0;
        for _ in 0..50 {
            mixed.reset_arena();
            if mixed.pusher(Side::Near).mode() == ControlMode::Scripted {
                scripted += 1;
            }
        }
        assert!(scripted > 0 && scripted < 50);
    }

    #[test]
    fn test_scripted_pushers_chase_without_feedback() {
        let mut s = settings();
        s.episode.policy_probability = 0.0;
        let mut arena = arena(&s);

        let mut struck = false;
        for _ in 0..200 {
            let report = arena.step(&IdlePolicy);
            assert!(report.transitions.is_empty());
            struck |= report
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::PuckStrike { .. }));
        }
        assert!(struck);
    }

    #[test]
    fn test_snapshot_world_positions() {
        let s = settings();
        let origin = Vec3::new(10.0, 0.0, -15.0);
        let arena = Arena::new(3, origin, &s).unwrap();
        let snap = arena.snapshot();
        assert_eq!(snap.arena, 3);
        assert_eq!(snap.puck.world, origin + snap.puck.local);
        assert_eq!(snap.pushers[0].body.world, origin + Vec3::new(-1.5, 0.0, 0.0));
    }

    #[test]
    fn test_external_reset_ends_both_episodes() {
        let s = settings();
        let mut arena = arena(&s);
        arena.step(&IdlePolicy);

        assert!(arena.request_reset(ResetReason::External));
        let report = arena.step(&IdlePolicy);
        assert_eq!(report.reset, Some(ResetReason::External));
        assert_eq!(report.transitions.len(), 2);
        assert!(report.transitions.iter().all(|t| t.done));
    }

    #[test]
    fn test_immediate_reset_closes_open_episodes() {
        let s = settings();
        let mut arena = arena(&s);
        arena.step(&IdlePolicy);

        let report = arena.reset_arena();
        assert_eq!(report.reset, Some(ResetReason::External));
        assert_eq!(count_resets(&report), 1);
        assert_eq!(report.transitions.len(), 2);
        for t in &report.transitions {
            assert!(t.done);
            assert_eq!(t.reward, 0.0);
        }

        // Nothing left open: a second reset closes no episode
        assert!(arena.reset_arena().transitions.is_empty());
    }

    #[test]
    fn test_start_pose_outside_half_is_rejected() {
        let mut s = settings();
        s.table.near_start = Vec3::new(0.8, 0.0, 0.0);
        let err = Arena::new(0, Vec3::ZERO, &s).unwrap_err();
        assert!(matches!(err, ArenaError::StartOutOfRange { body: "near pusher", .. }));

        let mut s = settings();
        s.table.far_start = Vec3::new(1.5, 0.0, 0.95);
        let err = Arena::new(0, Vec3::ZERO, &s).unwrap_err();
        assert!(matches!(err, ArenaError::StartOutOfRange { body: "far pusher", .. }));

        let mut s = settings();
        s.table.puck_start = Vec3::new(2.5, 0.0, 0.0);
        let err = Arena::new(0, Vec3::ZERO, &s).unwrap_err();
        assert!(matches!(err, ArenaError::StartOutOfRange { body: "puck", .. }));
    }

    fn place_pushers(arena: &mut Arena, near_vx: f32) {
        let near = arena.pusher_mut(Side::Near);
        near.body.pos = Vec3::new(-0.1, 0.0, 0.5);
        near.body.vel = Vec3::new(near_vx, 0.0, 0.0);
        let far = arena.pusher_mut(Side::Far);
        far.body.pos = Vec3::new(0.1, 0.0, 0.5);
        far.body.vel = Vec3::new(-near_vx, 0.0, 0.0);
    }

    #[test]
    fn test_pushers_bounce_apart_at_centre_line() {
        let s = settings();
        let mut arena = arena(&s);
        place_pushers(&mut arena, 1.0);

        let report = arena.step(&IdlePolicy);
        let near = arena.pusher(Side::Near).body;
        let far = arena.pusher(Side::Far).body;

        let gap = near.pos.distance(far.pos);
        assert!(gap >= near.radius + far.radius - 1e-5, "gap {gap}");
        // Idle decel leaves 0.64 m/s each; equal masses swap it
        assert!((near.vel.x + 0.64).abs() < 1e-4, "near {}", near.vel.x);
        assert!((far.vel.x - 0.64).abs() < 1e-4, "far {}", far.vel.x);
        assert_eq!(near.pos.z, 0.5);
        assert!(
            !report
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::PuckStrike { .. }))
        );
    }

    #[test]
    fn test_separating_pushers_keep_velocity() {
        let s = settings();
        let mut arena = arena(&s);
        place_pushers(&mut arena, -1.0);

        arena.step(&IdlePolicy);
        let near = arena.pusher(Side::Near).body;
        let far = arena.pusher(Side::Far).body;
        assert!(near.pos.distance(far.pos) >= near.radius + far.radius - 1e-5);
        assert!((near.vel.x + 0.64).abs() < 1e-4);
        assert!((far.vel.x - 0.64).abs() < 1e-4);
    }
}
