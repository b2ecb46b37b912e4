// Registry koneksi live per conversation dan fan-out message baru.
// Broadcast tidak pernah await: snapshot sender di bawah read lock lalu try_send.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::domain::MessageFrame;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

pub type Outbound = Arc<MessageFrame>;

struct Peer {
    user_id: i32,
    tx: mpsc::Sender<Outbound>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

pub struct ConversationHub {
    rooms: RwLock<HashMap<i32, HashMap<Uuid, Peer>>>,
    queue_capacity: usize,
}

/// Guard registrasi. Drop = unregister, di semua jalur exit.
pub struct Registration {
    hub: Arc<ConversationHub>,
    conversation_id: i32,
    connection_id: Uuid,
}

impl Registration {
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.hub.unregister(self.conversation_id, self.connection_id);
    }
}

impl ConversationHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    // Lock poisoning tidak membuat registry tidak bisa dipakai
    fn read(&self) -> RwLockReadGuard<'_, HashMap<i32, HashMap<Uuid, Peer>>> {
        self.rooms.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<i32, HashMap<Uuid, Peer>>> {
        self.rooms.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Daftarkan koneksi baru dan kembalikan guard + queue outbound (bounded)
    pub fn register(self: &Arc<Self>, conversation_id: i32, user_id: i32) -> (Registration, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let connection_id = Uuid::new_v4();

        let total = {
            let mut rooms = self.write();
            let room = rooms.entry(conversation_id).or_default();
            room.insert(connection_id, Peer { user_id, tx });
            room.len()
        };

        tracing::info!(
            %connection_id,
            conversation_id,
            user_id,
            connections = total,
            "Connection registered"
        );

        let registration = Registration {
            hub: Arc::clone(self),
            conversation_id,
            connection_id,
        };

        (registration, rx)
    }

    // Idempotent, dipanggil dari Drop guard
    fn unregister(&self, conversation_id: i32, connection_id: Uuid) {
        let removed = {
            let mut rooms = self.write();
            let removed = rooms
                .get_mut(&conversation_id)
                .and_then(|room| room.remove(&connection_id));

            if rooms.get(&conversation_id).is_some_and(|room| room.is_empty()) {
                rooms.remove(&conversation_id);
            }
            removed
        };

        if let Some(peer) = removed {
            tracing::info!(
                %connection_id,
                conversation_id,
                user_id = peer.user_id,
                "Connection unregistered"
            );
        }
    }

    /// Kirim frame ke semua koneksi di conversation. Queue penuh = frame di-drop
    /// untuk koneksi itu saja.
    pub fn broadcast(&self, conversation_id: i32, frame: Outbound) -> BroadcastReport {
        let targets: Vec<(Uuid, mpsc::Sender<Outbound>)> = {
            let rooms = self.read();
            match rooms.get(&conversation_id) {
                Some(room) => room.iter().map(|(id, peer)| (*id, peer.tx.clone())).collect(),
                None => return BroadcastReport::default(),
            }
        };

        let mut report = BroadcastReport::default();
        for (connection_id, tx) in targets {
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%connection_id, conversation_id, "Outbound queue full, frame dropped");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%connection_id, conversation_id, "Outbound queue closed");
                    report.dropped += 1;
                }
            }
        }

        report
    }

    /// Shutdown: kosongkan registry supaya semua outbound worker berhenti
    pub fn close_all(&self) {
        let closed: usize = {
            let mut rooms = self.write();
            let total = rooms.values().map(HashMap::len).sum();
            rooms.clear();
            total
        };
        tracing::info!(connections = closed, "All live connections closed");
    }

    pub fn connection_count(&self, conversation_id: i32) -> usize {
        self.read().get(&conversation_id).map_or(0, HashMap::len)
    }

    pub fn total_connections(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }
}

impl Default for ConversationHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
