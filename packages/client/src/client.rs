//! Client event loop and its handle
//!
//! [`SyncClient::spawn`] starts media attachment and one event-loop task.
//! The loop owns the [`ClientContext`] and multiplexes hub frames, local
//! commands, heartbeat ticks, reconnects and the attachment outcome.

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use lockstep_protocol::{PlaybackEvent, ServerMessage};

use crate::attachment::{AttachmentGate, MediaAttacher, Readiness};
use crate::config::ClientConfig;
use crate::connection::{
    dial, next_inbound, open_link, poll_dial, Dial, Inbound, Inbox, LinkState, ReconnectPolicy,
};
use crate::context::{ClientContext, Control};
use crate::error::{ClientError, ClientResult};
use crate::player::MediaPlayer;
use crate::role::{Role, RoleTransition};
use crate::status::Status;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

enum Command {
    Control {
        control: Control,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    SetRole {
        role: Role,
        reply: oneshot::Sender<RoleTransition>,
    },
    ToggleRole {
        reply: oneshot::Sender<RoleTransition>,
    },
}

/// Entry point for running a player client
pub struct SyncClient;

impl SyncClient {
    /// Attach media, connect to the hub and run until shut down
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<P: MediaPlayer>(config: ClientConfig, player: P) -> ClientHandle {
        let (opener, gate) = AttachmentGate::channel();
        tokio::spawn(MediaAttacher::new(config.media_url.clone()).run(opener));

        let (ctx, status) = ClientContext::new(player, config.role, config.heartbeat_interval);
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();

        info!(
            hub = %config.hub_url,
            media = %config.media_url,
            role = %config.role,
            "Starting sync client"
        );

        let event_loop = EventLoop {
            ctx,
            commands: command_rx,
            gate: gate.clone(),
            hub_url: config.hub_url,
            reconnect: config.reconnect,
            shutdown: shutdown.clone(),
        };
        tokio::spawn(event_loop.run());

        ClientHandle {
            commands,
            status,
            gate,
            shutdown,
        }
    }
}

/// Handle for controlling a running client; cheap to clone
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Status>,
    gate: AttachmentGate,
    shutdown: CancellationToken,
}

impl ClientHandle {
    /// Unmute and play once the media source is attached
    pub async fn start(&self) -> ClientResult<()> {
        self.control(Control::Start).await
    }

    pub async fn play(&self) -> ClientResult<()> {
        self.control(Control::Play).await
    }

    pub async fn pause(&self) -> ClientResult<()> {
        self.control(Control::Pause).await
    }

    /// Seek to `time` seconds; must be finite and non-negative
    pub async fn seek(&self, time: f64) -> ClientResult<()> {
        PlaybackEvent::seek(time)?;
        self.control(Control::Seek(time)).await
    }

    pub async fn set_role(&self, role: Role) -> ClientResult<RoleTransition> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetRole { role, reply }).await?;
        rx.await.map_err(|_| ClientError::ClientStopped)
    }

    pub async fn toggle_role(&self) -> ClientResult<RoleTransition> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ToggleRole { reply }).await?;
        rx.await.map_err(|_| ClientError::ClientStopped)
    }

    /// Latest status snapshot
    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    /// Wait until the hub has acknowledged a link
    pub async fn wait_until_connected(&self) -> ClientResult<()> {
        let mut status = self.status.clone();
        status
            .wait_for(|s| s.link.is_connected())
            .await
            .map(|_| ())
            .map_err(|_| ClientError::ClientStopped)
    }

    /// Wait for the media attachment outcome
    pub async fn wait_until_attached(&self) -> Readiness {
        self.gate.clone().wait().await
    }

    /// Stop the event loop; pending calls fail with `ClientStopped`
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait until the event loop has exited
    pub async fn closed(&self) {
        self.commands.closed().await;
    }

    async fn control(&self, control: Control) -> ClientResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Control { control, reply }).await?;
        rx.await.map_err(|_| ClientError::ClientStopped)?
    }

    async fn send(&self, command: Command) -> ClientResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::ClientStopped)
    }
}

struct EventLoop<P> {
    ctx: ClientContext<P>,
    commands: mpsc::Receiver<Command>,
    gate: AttachmentGate,
    hub_url: Url,
    reconnect: ReconnectPolicy,
    shutdown: CancellationToken,
}

impl<P: MediaPlayer> EventLoop<P> {
    async fn run(mut self) {
        let mut inbox: Option<Inbox> = None;
        let mut dialing: Option<Dial> = Some(dial(self.hub_url.clone(), self.reconnect.delay_for(0)));
        // Next slot in the reconnect schedule; rewound only by the hub's greeting
        let mut attempt: u32 = 1;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,

                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },

                result = poll_dial(&mut dialing) => {
                    dialing = None;
                    match result {
                        Ok(stream) => {
                            let (outbound, new_inbox) = open_link(stream);
                            self.ctx.on_link_open(outbound);
                            inbox = Some(new_inbox);
                        }
                        Err(e) => {
                            warn!(attempt, error = %e, "Failed to connect to hub");
                            dialing = Some(self.redial(&mut attempt));
                        }
                    }
                }

                inbound = next_inbound(&mut inbox) => match inbound {
                    Inbound::Message(msg) => {
                        if matches!(msg, ServerMessage::Connected(_)) {
                            attempt = 0;
                        }
                        self.ctx.on_server_message(msg);
                    }
                    Inbound::Closed => {
                        warn!(attempt, "Link to hub lost, reconnecting");
                        inbox = None;
                        self.ctx.on_link_lost();
                        dialing = Some(self.redial(&mut attempt));
                    }
                },

                readiness = self.gate.wait(), if self.ctx.readiness().is_pending() => {
                    self.ctx.on_attachment(readiness);
                }

                _ = self.ctx.heartbeat.tick() => self.ctx.on_heartbeat_tick(),
            }
        }

        self.ctx.shutdown();
        info!("Sync client stopped");
    }

    /// Dial again after the delay for `attempt`, then advance it
    ///
    /// A link that closes before the hub greets it counts as a failed
    /// attempt, so accept-then-close peers still back off.
    fn redial(&mut self, attempt: &mut u32) -> Dial {
        let delay = self.reconnect.delay_for(*attempt);
        *attempt = attempt.saturating_add(1);
        debug!(attempt = *attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        self.ctx.set_link_state(LinkState::Reconnecting { attempt: *attempt });
        dial(self.hub_url.clone(), delay)
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Control { control, reply } => self.ctx.on_control(control, reply),
            Command::SetRole { role, reply } => {
                let _ = reply.send(self.ctx.set_role(role));
            }
            Command::ToggleRole { reply } => {
                let _ = reply.send(self.ctx.toggle_role());
            }
        }
    }
}
