use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Payload relayed between members. Shared so a fan-out to N members
/// doesn't copy the text N times.
pub type Payload = Arc<str>;

pub type Outbox = mpsc::UnboundedSender<Payload>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Member {
    id: ConnectionId,
    outbox: Outbox,
}

/// Members of one room, in join order.
#[derive(Default)]
pub struct Room {
    members: Vec<Member>,
}

impl Room {
    fn add_member(&mut self, id: ConnectionId, outbox: Outbox) -> bool {
        if self.members.iter().any(|m| m.id == id) {
            return false;
        }
        self.members.push(Member { id, outbox });
        true
    }

    fn remove_member(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Process-wide mapping from room id to its members.
///
/// Join and leave go through the map's entry API, so they hold the shard
/// write lock for that room while the member list changes; broadcast holds
/// the read lock while it enqueues. A broadcast therefore sees either the
/// list before or after a concurrent join/leave, never a partial one.
/// Nothing here awaits while a guard is held.
#[derive(Default)]
pub struct Registry {
    rooms: DashMap<String, Room>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` in `room_id`, creating the room if absent.
    pub fn join(&self, room_id: &str, id: ConnectionId, outbox: Outbox) {
        let size = match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(mut e) => {
                if !e.get_mut().add_member(id, outbox) {
                    warn!("connection {id} joined room {room_id} twice");
                }
                e.get().len()
            }
            Entry::Vacant(e) => {
                debug!("room {room_id} created");
                let mut room = Room::default();
                room.add_member(id, outbox);
                e.insert(room).len()
            }
        };
        info!("connection {id} joined room {room_id} ({size} members)");
    }

    /// Removes `id` from `room_id` and drops the room once it is empty.
    /// Unknown rooms and connections are ignored.
    pub fn leave(&self, room_id: &str, id: ConnectionId) {
        let Entry::Occupied(mut e) = self.rooms.entry(room_id.to_string()) else {
            return;
        };
        if !e.get_mut().remove_member(id) {
            return;
        }
        let size = e.get().len();
        info!("connection {id} left room {room_id} ({size} members)");
        if e.get().is_empty() {
            e.remove();
            debug!("room {room_id} removed");
        }
    }

    /// Enqueues `payload` for every member of `room_id` except `sender`.
    /// Returns how many members it was enqueued for.
    pub fn broadcast(&self, room_id: &str, payload: &Payload, sender: ConnectionId) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            return 0;
        };
        let mut delivered = 0;
        for member in room.members.iter().filter(|m| m.id != sender) {
            match member.outbox.send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => debug!("connection {} in room {room_id} is gone, skipping", member.id),
            }
        }
        delivered
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|room| room.len()).unwrap_or(0)
    }

    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }
}
