//! Action intake.
//!
//! Network tasks push [`Inbound`] messages through a cloneable
//! [`IntakeHandle`]; the tick thread drains them all at the start of a tick.
//! Nothing on the network side touches world state. Effects the simulation
//! schedules for itself (delayed retaliation, deferred removal) live in the
//! tick-indexed [`Schedule`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use gr_core::ActorId;

use crate::action::Action;
use crate::sync::Outbound;

/// Credentials a connection presents before joining. Authentication happens
/// outside the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    /// Storage key.
    pub account_id: i64,
    /// Display name.
    pub username: String,
}

/// A message from the network side.
pub enum Inbound {
    /// A connection finished logging in.
    Join {
        /// Id the player's actor will carry.
        session: ActorId,
        /// Account to load.
        login: Login,
        /// Where this connection's snapshots go.
        outbound: Box<dyn Outbound>,
    },
    /// A connection closed.
    Leave {
        /// The player's actor id.
        session: ActorId,
    },
    /// A player intent.
    Act {
        /// Originating player.
        player: ActorId,
        /// What they asked for.
        action: Action,
    },
}

impl fmt::Debug for Inbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inbound::Join { session, login, .. } => f
                .debug_struct("Join")
                .field("session", session)
                .field("login", login)
                .finish_non_exhaustive(),
            Inbound::Leave { session } => f.debug_struct("Leave").field("session", session).finish(),
            Inbound::Act { player, action } => f
                .debug_struct("Act")
                .field("player", player)
                .field("action", action)
                .finish(),
        }
    }
}

/// Intake failures, seen by the network side.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// The intent could not be decoded.
    #[error("malformed intent: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The simulation is gone.
    #[error("simulation is no longer accepting input")]
    Closed,
}

/// Producer side of the intake queue.
#[derive(Debug, Clone)]
pub struct IntakeHandle {
    tx: Sender<Inbound>,
}

impl IntakeHandle {
    /// Queue any inbound message.
    pub fn send(&self, message: Inbound) -> Result<(), IntakeError> {
        self.tx.send(message).map_err(|_| IntakeError::Closed)
    }

    /// Queue a join.
    pub fn join(
        &self,
        session: ActorId,
        login: Login,
        outbound: Box<dyn Outbound>,
    ) -> Result<(), IntakeError> {
        self.send(Inbound::Join {
            session,
            login,
            outbound,
        })
    }

    /// Queue a disconnect.
    pub fn leave(&self, session: ActorId) -> Result<(), IntakeError> {
        self.send(Inbound::Leave { session })
    }

    /// Queue a decoded action.
    pub fn submit(&self, player: ActorId, action: Action) -> Result<(), IntakeError> {
        self.send(Inbound::Act { player, action })
    }

    /// Decode a wire intent and queue it for `player`. The sender is always
    /// the connection's own player, whatever the message claims.
    pub fn submit_wire(&self, player: ActorId, text: &str) -> Result<(), IntakeError> {
        let action = Action::from_wire(text)?;
        self.submit(player, action)
    }
}

/// The intake channel. The simulation keeps the receiving end.
#[derive(Debug)]
pub struct IntakeQueue {
    tx: Sender<Inbound>,
    rx: Receiver<Inbound>,
}

impl Default for IntakeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeQueue {
    /// A new unbounded queue.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// A producer handle.
    pub fn handle(&self) -> IntakeHandle {
        IntakeHandle {
            tx: self.tx.clone(),
        }
    }

    /// Everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<Inbound> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(m) => messages.push(m),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        messages
    }
}

/// Actions received this tick, grouped per player and kept in arrival order.
#[derive(Debug, Default)]
pub struct Inbox {
    pending: HashMap<ActorId, Vec<Action>>,
}

impl Inbox {
    /// Queue an action for `player`.
    pub fn push(&mut self, player: ActorId, action: Action) {
        self.pending.entry(player).or_default().push(action);
    }

    /// Take `player`'s actions for this tick.
    pub fn take(&mut self, player: ActorId) -> Vec<Action> {
        self.pending.remove(&player).unwrap_or_default()
    }

    /// Drop whatever was not consumed.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of players with pending actions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Something the simulation does to itself on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// An NPC that was hit strikes back.
    Retaliate {
        /// The NPC.
        npc: ActorId,
        /// Who hit it.
        attacker: ActorId,
    },
    /// Remove a disconnected player once out of combat.
    RemovePlayer {
        /// The player.
        player: ActorId,
    },
}

/// Effects keyed by the tick they are due on.
#[derive(Debug, Default)]
pub struct Schedule {
    due: BTreeMap<u64, Vec<Effect>>,
}

impl Schedule {
    /// Run `effect` at the start of `tick`.
    pub fn at(&mut self, tick: u64, effect: Effect) {
        self.due.entry(tick).or_default().push(effect);
    }

    /// Remove and return everything due on or before `tick`, oldest first.
    pub fn take_due(&mut self, tick: u64) -> Vec<Effect> {
        let later = self.due.split_off(&(tick + 1));
        let due = std::mem::replace(&mut self.due, later);
        due.into_values().flatten().collect()
    }

    /// Number of pending effects.
    pub fn len(&self) -> usize {
        self.due.values().map(Vec::len).sum()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_arrival_order() {
        let queue = IntakeQueue::new();
        let handle = queue.handle();
        let p = ActorId::new();
        handle.submit(p, Action::PlayerMove { x: 1, y: 1 }).unwrap();
        handle.submit(p, Action::PlayerMove { x: 2, y: 2 }).unwrap();
        handle.leave(p).unwrap();

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert!(matches!(
            drained[0],
            Inbound::Act {
                action: Action::PlayerMove { x: 1, y: 1 },
                ..
            }
        ));
        assert!(matches!(drained[2], Inbound::Leave { .. }));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn handles_work_across_threads() {
        let queue = IntakeQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let h = queue.handle();
                std::thread::spawn(move || {
                    h.submit(ActorId::new(), Action::PlayerMove { x: i, y: i }).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(queue.drain().len(), 4);
    }

    #[test]
    fn malformed_wire_intent_is_rejected() {
        let queue = IntakeQueue::new();
        let handle = queue.handle();
        let err = handle.submit_wire(ActorId::new(), r#"{"action":"fly"}"#).unwrap_err();
        assert!(matches!(err, IntakeError::Malformed(_)));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn inbox_groups_per_player() {
        let mut inbox = Inbox::default();
        let a = ActorId::new();
        let b = ActorId::new();
        inbox.push(a, Action::PlayerMove { x: 1, y: 0 });
        inbox.push(b, Action::LogOut);
        inbox.push(a, Action::PlayerMove { x: 2, y: 0 });
        assert_eq!(inbox.take(a).len(), 2);
        assert!(inbox.take(a).is_empty());
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn schedule_releases_due_effects_in_order() {
        let mut schedule = Schedule::default();
        let npc = ActorId::new();
        let player = ActorId::new();
        schedule.at(5, Effect::RemovePlayer { player });
        schedule.at(3, Effect::Retaliate { npc, attacker: player });
        schedule.at(7, Effect::RemovePlayer { player });

        assert!(schedule.take_due(2).is_empty());
        let due = schedule.take_due(5);
        assert_eq!(
            due,
            vec![
                Effect::Retaliate { npc, attacker: player },
                Effect::RemovePlayer { player },
            ]
        );
        assert_eq!(schedule.len(), 1);
    }
}
