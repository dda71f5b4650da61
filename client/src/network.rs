use crate::game::{ClientView, ViewEvent};
use crate::input::InputManager;
use crate::rendering::{RenderConfig, Renderer};
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use macroquad::prelude::next_frame;
use shared::{InputFlags, Packet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::interval;

/// How long the goal banner stays on screen after a score change.
const GOAL_BANNER_DURATION: Duration = Duration::from_secs(2);

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    name: String,
    player_id: Option<String>,
    connected: bool,

    view: ClientView,
    input_manager: InputManager,
    renderer: Renderer,

    last_snapshot: Option<Instant>,
    goal_banner_until: Option<Instant>,
}

impl Client {
    pub async fn new(server_addr: &str, name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            name: name.to_string(),
            player_id: None,
            connected: false,
            view: ClientView::new(),
            input_manager: InputManager::new(),
            renderer: Renderer::new(),
            last_snapshot: None,
            goal_banner_until: None,
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to host...");

        let packet = Packet::Connect {
            name: self.name.clone(),
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { player_id, team } => {
                info!("Connected as {} on team {:?}", player_id, team);
                self.player_id = Some(player_id);
                self.connected = true;
            }

            Packet::Snapshot {
                players,
                ball,
                scores,
            } => {
                self.last_snapshot = Some(Instant::now());

                let events = self.view.apply_snapshot(players, ball, scores);
                for event in events {
                    match event {
                        ViewEvent::Goal => {
                            info!(
                                "Goal! Score is now {} - {}",
                                self.view.scores.red, self.view.scores.blue
                            );
                            self.goal_banner_until = Some(Instant::now() + GOAL_BANNER_DURATION);
                        }
                    }
                }
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.player_id = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    async fn send_input(&mut self, flags: InputFlags) -> Result<(), Box<dyn std::error::Error>> {
        if !self.connected {
            return Ok(());
        }

        // Fire-and-forget; the keep-alive resend covers lost packets.
        self.send_packet(&Packet::Input { flags }).await?;

        Ok(())
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut input_interval = interval(Duration::from_millis(16));
        let mut render_interval = interval(Duration::from_millis(16));

        let mut buffer = [0u8; 2048];

        while self.renderer.is_open() {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    if let Some(flags) = self.input_manager.update() {
                        if let Err(e) = self.send_input(flags).await {
                            error!("Error sending input: {}", e);
                        }
                    }
                },

                _ = render_interval.tick() => {
                    // Smoothing runs per display frame, decoupled from the
                    // snapshot arrival rate.
                    self.view.interpolate();

                    let config = RenderConfig {
                        player_id: self.player_id.clone(),
                        snapshot_age_ms: self
                            .last_snapshot
                            .map(|t| t.elapsed().as_millis() as u64)
                            .unwrap_or(0),
                        goal_banner: self
                            .goal_banner_until
                            .is_some_and(|until| Instant::now() < until),
                    };

                    self.renderer.render(&self.view, &config);
                    next_frame().await;
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}
