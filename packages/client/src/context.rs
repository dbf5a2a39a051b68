//! Client state owned by the event loop
//!
//! Every handler here runs on the single event-loop task, so reading the
//! link state and sending on the link happen without interleaving.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use lockstep_protocol::{Action, PlaybackEvent, ServerMessage, SyncPayload};

use crate::attachment::Readiness;
use crate::connection::{LinkState, Outbound};
use crate::drift::{Correction, DriftCorrector};
use crate::error::{ClientError, ClientResult};
use crate::heartbeat::HeartbeatTimer;
use crate::player::MediaPlayer;
use crate::role::{Role, RoleState, RoleTransition};
use crate::status::Status;

/// A playback control issued by the local user
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Control {
    /// Unmute and play
    Start,
    Play,
    Pause,
    Seek(f64),
}

/// Work held back until the media source is attached
#[derive(Debug)]
enum Deferred {
    Local {
        control: Control,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    Remote(PlaybackEvent),
}

pub(crate) struct ClientContext<P> {
    player: P,
    role: RoleState,
    drift: DriftCorrector,
    pub(crate) heartbeat: HeartbeatTimer,
    outbound: Option<Outbound>,
    link_state: LinkState,
    readiness: Readiness,
    deferred: VecDeque<Deferred>,
    status: watch::Sender<Status>,
}

impl<P: MediaPlayer> ClientContext<P> {
    pub(crate) fn new(
        player: P,
        role: Role,
        heartbeat_period: Duration,
    ) -> (Self, watch::Receiver<Status>) {
        let (status, status_rx) = watch::channel(Status::new(role));
        let ctx = Self {
            player,
            role: RoleState::new(role),
            drift: DriftCorrector::new(),
            heartbeat: HeartbeatTimer::new(heartbeat_period),
            outbound: None,
            link_state: LinkState::Connecting,
            readiness: Readiness::Pending,
            deferred: VecDeque::new(),
            status,
        };
        (ctx, status_rx)
    }

    pub(crate) fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    // --- local controls ---

    /// Apply a local control now, defer it, or refuse it
    pub(crate) fn on_control(&mut self, control: Control, reply: oneshot::Sender<ClientResult<()>>) {
        match self.readiness.clone() {
            Readiness::Ready => {
                let _ = reply.send(self.apply_local(control));
            }
            Readiness::Pending => {
                debug!(?control, "Deferring control until media is attached");
                self.deferred.push_back(Deferred::Local { control, reply });
            }
            Readiness::Failed(reason) => {
                let _ = reply.send(Err(ClientError::Attachment(reason)));
            }
        }
    }

    /// Apply to the player, then emit if leading
    ///
    /// The player is updated even when emission fails.
    fn apply_local(&mut self, control: Control) -> ClientResult<()> {
        let action = match control {
            Control::Start => {
                self.player.set_muted(false);
                self.player.play();
                Action::Play
            }
            Control::Play => {
                self.player.play();
                Action::Play
            }
            Control::Pause => {
                self.player.pause();
                Action::Pause
            }
            Control::Seek(to) => {
                self.player.seek(to);
                Action::Seek
            }
        };

        if !self.role.is_leader() {
            return Ok(());
        }

        let event = PlaybackEvent::new(action, self.player.position())?;
        self.emit(event)
    }

    /// Hand `event` to the link; fails fast when there is no active link
    fn emit(&self, event: PlaybackEvent) -> ClientResult<()> {
        let outbound = match &self.outbound {
            Some(outbound) if self.link_state.is_connected() => outbound,
            _ => return Err(ClientError::NotConnected),
        };

        outbound.send(event.into())?;
        debug!(action = %event.action, time = event.time, "Emitted playback event");
        Ok(())
    }

    pub(crate) fn on_heartbeat_tick(&mut self) {
        let position = self.player.position();
        let result = PlaybackEvent::heartbeat(position)
            .map_err(ClientError::from)
            .and_then(|event| self.emit(event));

        if let Err(e) = result {
            warn!(error = %e, time = position, "Heartbeat not sent");
        }
    }

    // --- roles ---

    pub(crate) fn set_role(&mut self, role: Role) -> RoleTransition {
        let transition = self.role.set(role);
        self.after_role_change(transition);
        transition
    }

    pub(crate) fn toggle_role(&mut self) -> RoleTransition {
        let transition = self.role.toggle();
        self.after_role_change(transition);
        transition
    }

    fn after_role_change(&mut self, transition: RoleTransition) {
        match transition {
            RoleTransition::Unchanged => return,
            RoleTransition::BecameLeader => info!("Now leading playback"),
            RoleTransition::BecameFollower => {
                self.drift.reset();
                info!("Now following playback");
            }
        }
        self.refresh_heartbeat();
        self.publish();
    }

    // --- inbound ---

    pub(crate) fn on_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Connected(payload) => {
                info!(session_id = %payload.session_id, "Connected to hub");
                self.set_link_state(LinkState::Connected {
                    session_id: payload.session_id,
                });
            }
            ServerMessage::Sync(payload) => self.on_remote(payload),
            ServerMessage::Error(payload) => {
                warn!(code = %payload.code, message = %payload.message, "Hub rejected a frame");
            }
        }
    }

    fn on_remote(&mut self, payload: SyncPayload) {
        let event = match PlaybackEvent::try_from(&payload) {
            Ok(event) => event,
            Err(e) => {
                debug!(action = %payload.action, time = payload.time, error = %e, "Ignoring remote event");
                return;
            }
        };

        match self.readiness {
            Readiness::Ready => self.apply_remote(event),
            Readiness::Pending => self.defer_remote(event),
            Readiness::Failed(_) => {
                debug!(action = %event.action, "Ignoring remote event, media not attached");
            }
        }
    }

    /// Queue a relayed event until attachment; only the newest heartbeat is kept
    fn defer_remote(&mut self, event: PlaybackEvent) {
        if event.action == Action::Heartbeat {
            self.deferred.retain(|item| {
                !matches!(item, Deferred::Remote(queued) if queued.action == Action::Heartbeat)
            });
        }
        self.deferred.push_back(Deferred::Remote(event));
    }

    /// Apply a relayed event; never re-emitted
    fn apply_remote(&mut self, event: PlaybackEvent) {
        match event.action {
            Action::Play => self.player.play(),
            Action::Pause => self.player.pause(),
            Action::Seek => self.player.seek(event.time),
            Action::Heartbeat => {
                if self.role.is_leader() {
                    return;
                }
                let local = self.player.position();
                match self.drift.observe(local, event.time) {
                    Correction::Snap { to, drift } => {
                        debug!(local, remote = to, drift, "Correcting drift");
                        self.player.seek(to);
                    }
                    Correction::InSync { .. } => {}
                }
            }
        }
    }

    // --- link ---

    pub(crate) fn on_link_open(&mut self, outbound: Outbound) {
        self.outbound = Some(outbound);
    }

    /// Drop the link; emission fails until the hub greets a new one
    pub(crate) fn on_link_lost(&mut self) {
        self.outbound = None;
    }

    pub(crate) fn set_link_state(&mut self, state: LinkState) {
        if self.link_state == state {
            return;
        }
        self.link_state = state;
        self.refresh_heartbeat();
        self.publish();
    }

    // --- attachment ---

    pub(crate) fn on_attachment(&mut self, readiness: Readiness) {
        self.readiness = readiness;
        self.refresh_heartbeat();
        self.publish();

        let deferred = std::mem::take(&mut self.deferred);
        match self.readiness.clone() {
            Readiness::Ready => {
                for item in deferred {
                    match item {
                        Deferred::Local { control, reply } => {
                            let _ = reply.send(self.apply_local(control));
                        }
                        Deferred::Remote(event) => self.apply_remote(event),
                    }
                }
            }
            Readiness::Failed(reason) => {
                warn!(reason = %reason, "Media attachment failed");
                for item in deferred {
                    if let Deferred::Local { reply, .. } = item {
                        let _ = reply.send(Err(ClientError::Attachment(reason.clone())));
                    }
                }
            }
            Readiness::Pending => self.deferred = deferred,
        }
    }

    /// Answer anything still waiting and mark the link down
    pub(crate) fn shutdown(&mut self) {
        for item in self.deferred.drain(..) {
            if let Deferred::Local { reply, .. } = item {
                let _ = reply.send(Err(ClientError::ClientStopped));
            }
        }
        self.outbound = None;
        self.set_link_state(LinkState::Disconnected);
    }

    /// Heartbeats run only while leading, connected and attached
    fn refresh_heartbeat(&mut self) {
        let armed = self.role.is_leader()
            && self.link_state.is_connected()
            && self.readiness.is_ready();
        if armed != self.heartbeat.is_armed() {
            debug!(armed, "Heartbeat timer changed");
        }
        self.heartbeat.set_armed(armed);
    }

    fn publish(&self) {
        self.status.send_replace(Status {
            link: self.link_state.clone(),
            media: self.readiness.clone(),
            role: self.role.role(),
        });
    }
}
