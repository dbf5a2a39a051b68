//! Playback event relay
//!
//! The hub holds no playback semantics: whatever a session sends as a
//! playback event goes verbatim to every other session.

use lockstep_protocol::{Action, ClientMessage, ErrorPayload, ServerMessage, SessionId, SyncPayload};

use super::connection::{BroadcastReport, SessionRegistry};

/// Routes messages for a single session
pub struct RelayHandler {
    session_id: SessionId,
    registry: SessionRegistry,
}

impl RelayHandler {
    pub fn new(session_id: SessionId, registry: SessionRegistry) -> Self {
        Self {
            session_id,
            registry,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Handle an incoming client message
    pub fn handle_message(&self, message: ClientMessage) -> Result<BroadcastReport, RelayError> {
        match message {
            ClientMessage::PlaybackEvent(payload) => Ok(self.relay_playback_event(payload)),
        }
    }

    /// Handle a raw text frame, answering the sender if it does not parse
    pub fn handle_text(&self, text: &str) -> Result<BroadcastReport, RelayError> {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => {
                self.send_to_self(ServerMessage::Error(ErrorPayload::invalid_message(
                    e.to_string(),
                )));
                Err(RelayError::Serialization(e))
            }
        }
    }

    fn relay_playback_event(&self, payload: SyncPayload) -> BroadcastReport {
        // Unknown actions are relayed anyway; receivers decide
        if payload.action.parse::<Action>().is_err() {
            tracing::debug!(
                session_id = %self.session_id,
                action = %payload.action,
                "Relaying unrecognized playback action"
            );
        }

        let action = payload.action.clone();
        let time = payload.time;
        let report = self
            .registry
            .broadcast(&self.session_id, ServerMessage::Sync(payload));

        tracing::trace!(
            session_id = %self.session_id,
            action = %action,
            time,
            delivered = report.delivered,
            dropped = report.dropped,
            "Relayed playback event"
        );

        report
    }

    fn send_to_self(&self, msg: ServerMessage) {
        if let Err(e) = self.registry.send_to(&self.session_id, msg) {
            tracing::debug!(
                session_id = %self.session_id,
                error = %e,
                "Failed to send message to self"
            );
        }
    }
}

/// Errors that can occur while handling a frame
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid frame: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    fn setup(n: usize) -> (SessionRegistry, Vec<(SessionId, mpsc::Receiver<ServerMessage>)>) {
        let registry = SessionRegistry::new();
        let sessions = (0..n)
            .map(|_| {
                let (tx, rx) = mpsc::channel(16);
                (registry.connect(tx).id, rx)
            })
            .collect();
        (registry, sessions)
    }

    #[test]
    fn test_playback_event_fans_out_to_others() {
        let (registry, mut sessions) = setup(3);
        let handler = RelayHandler::new(sessions[0].0, registry);

        let report = handler
            .handle_message(ClientMessage::PlaybackEvent(SyncPayload::new("seek", 42.3)))
            .unwrap();
        assert_eq!(report.delivered, 2);

        assert!(sessions[0].1.try_recv().is_err());
        for (_, rx) in sessions.iter_mut().skip(1) {
            assert_eq!(
                rx.try_recv().unwrap(),
                ServerMessage::Sync(SyncPayload::new("seek", 42.3))
            );
        }
    }

    #[test]
    fn test_unknown_action_is_relayed_verbatim() {
        let (registry, mut sessions) = setup(2);
        let handler = RelayHandler::new(sessions[0].0, registry);

        handler
            .handle_text(r#"{"type":"PlaybackEvent","payload":{"action":"rewind","time":3.0}}"#)
            .unwrap();

        assert_eq!(
            sessions[1].1.try_recv().unwrap(),
            ServerMessage::Sync(SyncPayload::new("rewind", 3.0))
        );
    }

    #[test]
    fn test_malformed_frame_answers_sender_only() {
        let (registry, mut sessions) = setup(2);
        let handler = RelayHandler::new(sessions[0].0, registry);

        let result = handler.handle_text("not json");
        assert_matches!(result, Err(RelayError::Serialization(_)));

        assert_matches!(
            sessions[0].1.try_recv(),
            Ok(ServerMessage::Error(ErrorPayload { ref code, .. })) if code == "INVALID_MESSAGE"
        );
        assert!(sessions[1].1.try_recv().is_err());
    }
}
