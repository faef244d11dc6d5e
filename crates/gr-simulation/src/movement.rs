//! Route planning and per-tick stepping.

use gr_core::pathfinding::octile;
use gr_core::{Direction, TilePos, find_path};
use tracing::debug;

use crate::actor::Actor;
use crate::context::SimContext;

/// What one call to [`step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No destination.
    Idle,
    /// Moved one tile.
    Moved,
    /// The next tile was taken; the waypoint is kept for next tick.
    Stalled,
    /// Gave up after stalling too long, or no route exists.
    GaveUp,
    /// Reached the end of the route.
    Arrived,
}

/// Where a pursuing actor stands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pursuit {
    /// Not pursuing anything.
    NoTarget,
    /// The target vanished, died, or went into hiding; the target was dropped.
    Lost,
    /// Close enough to act.
    InReach,
    /// Still walking.
    Chasing,
}

/// Compute a fresh route to the actor's destination, keeping at most
/// `max_waypoints` steps. Returns false (and stops the actor) when the
/// destination cannot be reached.
pub fn plan(actor: &mut Actor, ctx: &SimContext<'_>) -> bool {
    actor.nav.replan = false;
    actor.nav.waypoints.clear();
    let Some(destination) = actor.nav.destination else {
        return false;
    };
    let path = find_path(ctx.map, actor.position(), destination);
    let Some(end) = path.end() else {
        debug!(actor = %actor.label(), %destination, "no route");
        actor.stop();
        return false;
    };
    actor.nav.route_end = Some(end);
    actor.nav.waypoints = path
        .tiles
        .into_iter()
        .skip(1)
        .take(ctx.config.max_waypoints)
        .collect();
    true
}

/// Advance the actor by at most one tile along its route.
pub fn step(actor: &mut Actor, ctx: &SimContext<'_>) -> StepOutcome {
    if actor.nav.destination.is_none() {
        actor.set_next_direction(Direction::None);
        return StepOutcome::Idle;
    }
    if actor.nav.replan && !plan(actor, ctx) {
        return StepOutcome::GaveUp;
    }

    let here = actor.position();
    while actor.nav.waypoints.front() == Some(&here) {
        actor.nav.waypoints.pop_front();
    }
    if actor.nav.waypoints.is_empty() {
        // A truncated route runs out before its end; plan the next leg.
        if actor.nav.route_end.is_some_and(|end| end != here) {
            if !plan(actor, ctx) {
                return StepOutcome::GaveUp;
            }
            if actor.nav.waypoints.front() == Some(&here) {
                actor.nav.waypoints.pop_front();
            }
        }
        if actor.nav.waypoints.is_empty() {
            actor.stop();
            return StepOutcome::Arrived;
        }
    }

    let Some(&next) = actor.nav.waypoints.front() else {
        return StepOutcome::Idle;
    };
    let direction = Direction::toward(here, next);
    if !ctx.map.can_step(here, next) {
        actor.nav.replan = true;
        return stall(actor, ctx);
    }
    if ctx.world.is_occupied(next) {
        actor.set_next_direction(direction);
        return stall(actor, ctx);
    }

    actor.nav.waypoints.pop_front();
    actor.nav.stalled_ticks = 0;
    actor.move_to(next, direction);
    let upcoming = actor
        .nav
        .waypoints
        .front()
        .map_or(Direction::None, |&t| Direction::toward(next, t));
    actor.set_next_direction(upcoming);
    if actor.is_player() {
        ctx.save_position(actor);
    }

    if actor.nav.waypoints.is_empty() && actor.nav.route_end == Some(next) {
        actor.stop();
        return StepOutcome::Arrived;
    }
    StepOutcome::Moved
}

fn stall(actor: &mut Actor, ctx: &SimContext<'_>) -> StepOutcome {
    actor.nav.stalled_ticks += 1;
    if actor.nav.stalled_ticks >= ctx.config.max_stall_ticks {
        debug!(actor = %actor.label(), at = %actor.position(), "route blocked, giving up");
        actor.stop();
        return StepOutcome::GaveUp;
    }
    StepOutcome::Stalled
}

/// Keep a pursuing actor's destination next to its target. Drops the target
/// when it is gone, dying, or hidden.
pub fn refresh_pursuit(actor: &mut Actor, ctx: &SimContext<'_>) -> Pursuit {
    let Some(target_id) = actor.engagement.target else {
        return Pursuit::NoTarget;
    };
    let target = ctx
        .world
        .actor(target_id)
        .filter(|t| t.is_present() && !t.is_dying());
    let Some(target) = target else {
        debug!(actor = %actor.label(), target = %target_id, "target lost");
        actor.disengage();
        actor.stop();
        return Pursuit::Lost;
    };

    let there = target.position();
    if ctx.in_reach(actor.position(), there) {
        actor.stop();
        actor.nav.target_last_seen = Some(there);
        return Pursuit::InReach;
    }
    if actor.nav.target_last_seen != Some(there) || actor.nav.destination.is_none() {
        actor.nav.target_last_seen = Some(there);
        let tile = approach_tile(actor.position(), there, ctx);
        actor.set_destination(tile);
    }
    Pursuit::Chasing
}

/// The free tile next to `target` from which `from` can act on it, nearest
/// to `from` first. Falls back to `target` itself.
pub fn approach_tile(from: TilePos, target: TilePos, ctx: &SimContext<'_>) -> TilePos {
    let directions: &[Direction] = if ctx.config.diagonal_reach {
        &Direction::ALL
    } else {
        &Direction::ORTHOGONAL
    };
    directions
        .iter()
        .map(|&d| target.step(d))
        .filter(|&t| {
            ctx.map.in_bounds(t) && !ctx.map.is_blocked(t) && (t == from || !ctx.world.is_occupied(t))
        })
        .min_by_key(|&t| octile(from, t))
        .unwrap_or(target)
}
