//! Peer roster management for the host
//!
//! Tracks which network address belongs to which player id, enforces the
//! capacity limit and sweeps inactive peers. Inputs are deliberately NOT
//! queued or sequenced here: the wire protocol is last-write-wins, so an
//! arriving input snapshot is applied straight onto the session by the
//! network loop and this module only records liveness.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// How long a peer may stay silent before it is dropped.
pub const PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// A connected remote peer and its liveness state.
#[derive(Debug)]
pub struct Peer {
    /// Player id this peer controls, e.g. `peer_3`.
    pub id: String,
    /// Network address for sending snapshots and responses.
    pub addr: SocketAddr,
    /// Last time any packet arrived from this address.
    pub last_seen: Instant,
}

impl Peer {
    pub fn new(id: String, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Roster of connected peers indexed by player id.
pub struct ClientManager {
    peers: HashMap<String, Peer>,
    next_peer: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            peers: HashMap::new(),
            next_peer: 1,
            max_clients,
        }
    }

    /// Admits a new peer, handing out the next `peer_N` id. Returns `None`
    /// when the roster is full.
    pub fn add_peer(&mut self, addr: SocketAddr) -> Option<String> {
        if self.peers.len() >= self.max_clients {
            return None;
        }

        let id = format!("peer_{}", self.next_peer);
        self.next_peer += 1;

        info!("Peer {} connected from {}", id, addr);
        self.peers.insert(id.clone(), Peer::new(id.clone(), addr));

        Some(id)
    }

    /// Drops a peer from the roster. Returns true if it was present.
    pub fn remove_peer(&mut self, id: &str) -> bool {
        if let Some(peer) = self.peers.remove(id) {
            info!("Peer {} disconnected", peer.id);
            true
        } else {
            false
        }
    }

    pub fn find_peer_by_addr(&self, addr: SocketAddr) -> Option<String> {
        self.peers
            .values()
            .find(|peer| peer.addr == addr)
            .map(|peer| peer.id.clone())
    }

    /// Refreshes the liveness timestamp for a peer. Unknown ids are ignored.
    pub fn touch(&mut self, id: &str) {
        if let Some(peer) = self.peers.get_mut(id) {
            peer.last_seen = Instant::now();
        }
    }

    /// Removes every peer that has been silent past the timeout and returns
    /// their ids so the session can drop the matching players.
    pub fn check_timeouts(&mut self) -> Vec<String> {
        let timed_out: Vec<String> = self
            .peers
            .values()
            .filter(|peer| peer.is_timed_out(PEER_TIMEOUT))
            .map(|peer| peer.id.clone())
            .collect();

        for id in &timed_out {
            self.remove_peer(id);
        }

        timed_out
    }

    /// All peer addresses, for snapshot broadcasting.
    pub fn get_peer_addrs(&self) -> Vec<(String, SocketAddr)> {
        self.peers
            .iter()
            .map(|(id, peer)| (id.clone(), peer.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
