//! Host network layer handling UDP communications and the authority loop
//!
//! Two fixed-rate drivers run inside one `tokio::select!` loop: the physics
//! tick at 60 Hz and the snapshot broadcast at 50 Hz. They are deliberately
//! decoupled; every broadcast carries the full state (all players, ball and
//! scores), so a lost snapshot is healed by the next one rather than retried.

use crate::client_manager::ClientManager;
use crate::game::{Session, SimEvent};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{InputFlags, Packet, BROADCAST_INTERVAL_MS, HOST_PLAYER_ID, TICK_RATE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to the main loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    PeerTimeout {
        player_id: String,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// The authoritative host: owns the session and coordinates all drivers.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    session: Session,
    /// Input captured by the host process itself, folded into the reserved
    /// `peer_host` player before every physics tick.
    local_input: InputFlags,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Host listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            session: Session::new(),
            local_input: InputFlags::default(),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Gives the host process its own player on the pitch, identified by the
    /// reserved id. Input for it is fed through `set_local_input`.
    pub fn add_host_player(&mut self, name: &str) {
        let team = self.session.assign_team();
        self.session.add_player(HOST_PLAYER_ID, name, team);
    }

    /// Stores the host's locally-captured input snapshot. Applied to the
    /// reserved player (if present) right before each tick.
    pub fn set_local_input(&mut self, flags: InputFlags) {
        self.local_input = flags;
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let peer_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_peer_addrs()
                        };

                        for (player_id, addr) in peer_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to peer {}: {}", player_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors peer timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for player_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::PeerTimeout { player_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Processes incoming packets and updates roster and session state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { name } => {
                info!("Peer connecting from {} as {:?}", addr, name);

                // A reconnect from the same address replaces the old entry.
                let existing = {
                    let clients = self.clients.read().await;
                    clients.find_peer_by_addr(addr)
                };

                if let Some(existing_id) = existing {
                    info!("Replacing existing peer {} from {}", existing_id, addr);
                    let mut clients = self.clients.write().await;
                    clients.remove_peer(&existing_id);
                    self.session.remove_player(&existing_id);
                }

                let player_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_peer(addr)
                };

                if let Some(player_id) = player_id {
                    let team = self.session.assign_team();
                    self.session.add_player(&player_id, &name, team);
                    let response = Packet::Connected { player_id, team };
                    self.send_packet(&response, addr).await;
                } else {
                    let response = Packet::Disconnected {
                        reason: "Match full".to_string(),
                    };
                    self.send_packet(&response, addr).await;
                }
            }

            Packet::Input { flags } => {
                let player_id = {
                    let clients = self.clients.read().await;
                    clients.find_peer_by_addr(addr)
                };

                // Plain overwrite, last write wins. Input from an unknown
                // address is dropped on the floor.
                if let Some(player_id) = player_id {
                    {
                        let mut clients = self.clients.write().await;
                        clients.touch(&player_id);
                    }
                    self.session.apply_input(&player_id, flags);
                }
            }

            Packet::Disconnect => {
                let player_id = {
                    let clients = self.clients.read().await;
                    clients.find_peer_by_addr(addr)
                };

                if let Some(player_id) = player_id {
                    let mut clients = self.clients.write().await;
                    clients.remove_peer(&player_id);
                    self.session.remove_player(&player_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from peer at {}", addr);
            }
        }
    }

    /// Reacts to events raised by the physics step. A goal queues one
    /// immediate snapshot so clients see the new score and reset positions
    /// without waiting for the broadcast timer.
    async fn handle_sim_events(&mut self, events: Vec<SimEvent>) {
        for event in events {
            match event {
                SimEvent::Goal { team } => {
                    info!("Goal for {:?}", team);
                    self.broadcast_snapshot().await;
                }
                SimEvent::Kick => {
                    debug!("Kick");
                }
            }
        }
    }

    /// Queues a full-state snapshot for every connected peer.
    async fn broadcast_snapshot(&self) {
        let is_empty = {
            let clients = self.clients.read().await;
            clients.is_empty()
        };

        if is_empty {
            return;
        }

        let packet = Packet::Snapshot {
            players: self.session.players.clone(),
            ball: self.session.ball,
            scores: self.session.scores,
        };

        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue snapshot broadcast: {}", e);
        }
    }

    /// Main loop coordinating packets, physics ticks and broadcasts
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        // The step size is a constant 1/60 s; wall-clock jitter in tick
        // delivery is not folded back into the integration.
        let mut physics_interval = interval(Duration::from_secs_f64(1.0 / TICK_RATE as f64));
        physics_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut broadcast_interval = interval(Duration::from_millis(BROADCAST_INTERVAL_MS));
        broadcast_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut tick: u64 = 0;

        info!("Host started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::PeerTimeout { player_id }) => {
                            self.session.remove_player(&player_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Host shutting down");
                            break;
                        }
                    }
                },

                _ = physics_interval.tick() => {
                    // The host is just another player inside the integrator.
                    self.session.apply_input(HOST_PLAYER_ID, self.local_input);

                    let events = self.session.step(Instant::now());
                    self.handle_sim_events(events).await;

                    tick += 1;
                    if tick % (TICK_RATE as u64 * 10) == 0 {
                        let peer_count = {
                            let clients = self.clients.read().await;
                            clients.len()
                        };
                        debug!(
                            "Tick {}: {} peers, {} players, score {} - {}",
                            tick,
                            peer_count,
                            self.session.players.len(),
                            self.session.scores.red,
                            self.session.scores.blue
                        );
                    }
                },

                _ = broadcast_interval.tick() => {
                    self.broadcast_snapshot().await;
                },
            }
        }

        Ok(())
    }
}
