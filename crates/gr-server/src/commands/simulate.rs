use std::collections::HashSet;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use crossbeam_channel::Receiver;
use gr_core::{ActorId, ContentRegistry, TilePos};
use gr_simulation::{
    Action, Actor, ActorState, Envelope, IntakeHandle, Login, MemoryStore, SimConfig, Simulation,
    World,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::codec;

/// Bots pick a new errand at most this often.
const BOT_THINK_TICKS: u64 = 5;
/// Chance an idle bot goes fighting rather than wandering.
const FIGHT_CHANCE: f64 = 0.6;
const WANDER_RADIUS: i32 = 6;
const FIRST_BOT_ACCOUNT: i64 = 9000;

struct Bot {
    session: ActorId,
    frames: Receiver<Envelope>,
}

#[derive(Debug, Default)]
struct Traffic {
    frames: usize,
    json_bytes: usize,
    wire_bytes: usize,
}

impl Traffic {
    fn record(&mut self, envelope: &Envelope) -> Result<(), String> {
        let json = serde_json::to_vec(envelope).map_err(|e| e.to_string())?;
        let frame = codec::encode(&json).map_err(|e| e.to_string())?;
        self.frames += 1;
        self.json_bytes += json.len();
        self.wire_bytes += frame.len();
        Ok(())
    }
}

pub fn run(
    map: Option<&Path>,
    content: Option<&Path>,
    ticks: u64,
    seed: u64,
    bots: usize,
) -> Result<(), String> {
    let (map, content) = super::load_world(map, content)?;
    let config = SimConfig::default()
        .with_seed(seed)
        .with_max_players(bots.max(1));
    let config = super::walkable_spawn(config, &map)?;

    let mut sim = Simulation::new(map, content, Box::new(MemoryStore::new()), config);
    sim.populate()
        .map_err(|e| format!("cannot populate world: {e}"))?;
    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;

    let intake = sim.intake_handle();
    let bots = join_bots(&intake, bots)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut traffic = Traffic::default();
    let mut dying = HashSet::new();
    let mut kills = 0usize;

    for tick in 0..ticks {
        if tick % BOT_THINK_TICKS == 1 {
            for bot in &bots {
                if let Some(action) = plan_errand(sim.world(), bot.session, &mut rng) {
                    intake
                        .submit(bot.session, action)
                        .map_err(|e| e.to_string())?;
                }
            }
        }
        sim.tick().map_err(|e| format!("simulation error: {e}"))?;
        let now: HashSet<ActorId> = sim
            .world()
            .npcs()
            .filter(|n| n.is_dying())
            .map(Actor::id)
            .collect();
        kills += now.difference(&dying).count();
        dying = now;
        for bot in &bots {
            for envelope in bot.frames.try_iter() {
                traffic.record(&envelope)?;
            }
        }
    }

    println!(
        "  {} {}",
        "Simulation".bold(),
        format!("({ticks} ticks, seed={seed}, bots={})", bots.len()).dimmed()
    );
    println!(
        "  {} players, {} NPCs, {} ground items after tick {}",
        sim.world().player_count(),
        sim.world().npc_count(),
        sim.world().items().len(),
        sim.current_tick()
    );
    println!("  {kills} NPCs slain");
    println!();

    println!("  {}", "Actors".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Kind", "Position", "HP", "Combat", "State"]);
    let mut actors: Vec<&Actor> = sim.world().players().chain(sim.world().npcs()).collect();
    actors.sort_by_key(|a| (a.is_npc(), display_name(a, sim.content())));
    for actor in actors {
        let pos = actor.position();
        table.add_row(vec![
            display_name(actor, sim.content()),
            if actor.is_player() { "player" } else { "npc" }.to_string(),
            format!("({}, {})", pos.x, pos.y),
            format!("{}/{}", actor.hitpoints(), actor.max_hitpoints()),
            actor.skills().combat_level().to_string(),
            state_label(actor.state()),
        ]);
    }
    println!("{table}");
    println!();

    println!("  {}", "Traffic".bold().underline());
    println!(
        "  {} frames, {} bytes of JSON, {} bytes on the wire",
        traffic.frames, traffic.json_bytes, traffic.wire_bytes
    );
    Ok(())
}

fn join_bots(intake: &IntakeHandle, count: usize) -> Result<Vec<Bot>, String> {
    let mut bots = Vec::with_capacity(count);
    for i in 0..count {
        let session = ActorId::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        let login = Login {
            account_id: FIRST_BOT_ACCOUNT + i as i64,
            username: format!("bot{}", i + 1),
        };
        intake
            .join(session, login, Box::new(tx))
            .map_err(|e| e.to_string())?;
        bots.push(Bot {
            session,
            frames: rx,
        });
    }
    Ok(bots)
}

/// An idle bot attacks the nearest NPC it can fight, or strolls somewhere
/// nearby.
fn plan_errand(world: &World, session: ActorId, rng: &mut StdRng) -> Option<Action> {
    let bot = world.actor(session)?;
    if bot.state() != ActorState::Idle {
        return None;
    }
    let here = bot.position();
    if rng.random_bool(FIGHT_CHANCE) {
        let prey = world
            .npcs()
            .filter(|n| n.is_present() && !n.is_dying())
            .filter(|n| n.npc_data().is_some_and(|d| d.attackable))
            .min_by_key(|n| (n.position().chebyshev(here), n.position().x, n.position().y));
        if let Some(prey) = prey {
            return Some(Action::PlayerAttackMove { target: prey.id() });
        }
    }
    let to = TilePos::new(
        here.x + rng.random_range(-WANDER_RADIUS..=WANDER_RADIUS),
        here.y + rng.random_range(-WANDER_RADIUS..=WANDER_RADIUS),
    );
    Some(Action::PlayerMove { x: to.x, y: to.y })
}

fn display_name(actor: &Actor, content: &ContentRegistry) -> String {
    actor
        .npc_data()
        .and_then(|n| content.species(n.species))
        .map(|s| s.name.clone())
        .unwrap_or_else(|| actor.label())
}

fn state_label(state: ActorState) -> String {
    let label = format!("{state:?}").to_lowercase();
    match state {
        ActorState::Dying => label.red().to_string(),
        ActorState::Attacking => label.yellow().to_string(),
        ActorState::Respawning => label.dimmed().to_string(),
        _ => label,
    }
}
