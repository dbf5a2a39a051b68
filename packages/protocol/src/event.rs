//! Typed playback events

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::messages::{ClientMessage, SyncPayload};

/// Playback action carried by a relayed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Play,
    Pause,
    Seek,
    /// Periodic leader position, used only for drift correction
    Heartbeat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Seek => "seek",
            Action::Heartbeat => "heartbeat",
        }
    }
}

impl FromStr for Action {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Action::Play),
            "pause" => Ok(Action::Pause),
            "seek" => Ok(Action::Seek),
            "heartbeat" => Ok(Action::Heartbeat),
            other => Err(EventError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors converting a wire payload into a [`PlaybackEvent`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("unknown playback action: {0}")]
    UnknownAction(String),

    #[error("invalid playback time: {0}")]
    InvalidTime(f64),
}

/// A playback intent with a validated action and position
///
/// The originating session is implicit: the hub knows who sent a frame and
/// never puts it in the payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackEvent {
    pub action: Action,
    /// Playback position in seconds, finite and non-negative
    pub time: f64,
}

impl PlaybackEvent {
    pub fn new(action: Action, time: f64) -> Result<Self, EventError> {
        if !time.is_finite() || time < 0.0 {
            return Err(EventError::InvalidTime(time));
        }
        Ok(Self { action, time })
    }

    pub fn play(time: f64) -> Result<Self, EventError> {
        Self::new(Action::Play, time)
    }

    pub fn pause(time: f64) -> Result<Self, EventError> {
        Self::new(Action::Pause, time)
    }

    pub fn seek(time: f64) -> Result<Self, EventError> {
        Self::new(Action::Seek, time)
    }

    pub fn heartbeat(time: f64) -> Result<Self, EventError> {
        Self::new(Action::Heartbeat, time)
    }
}

impl TryFrom<&SyncPayload> for PlaybackEvent {
    type Error = EventError;

    fn try_from(payload: &SyncPayload) -> Result<Self, Self::Error> {
        let action = payload.action.parse()?;
        Self::new(action, payload.time)
    }
}

impl From<PlaybackEvent> for SyncPayload {
    fn from(event: PlaybackEvent) -> Self {
        SyncPayload::new(event.action.as_str(), event.time)
    }
}

impl From<PlaybackEvent> for ClientMessage {
    fn from(event: PlaybackEvent) -> Self {
        ClientMessage::PlaybackEvent(event.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("play", Action::Play)]
    #[case("pause", Action::Pause)]
    #[case("seek", Action::Seek)]
    #[case("heartbeat", Action::Heartbeat)]
    fn test_action_parsing(#[case] raw: &str, #[case] expected: Action) {
        assert_eq!(raw.parse::<Action>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case("Play")]
    #[case("stop")]
    #[case("")]
    fn test_unknown_actions_rejected(#[case] raw: &str) {
        assert_matches!(raw.parse::<Action>(), Err(EventError::UnknownAction(a)) if a == raw);
    }

    #[test]
    fn test_negative_time_rejected() {
        assert_matches!(PlaybackEvent::seek(-1.0), Err(EventError::InvalidTime(_)));
        assert_matches!(PlaybackEvent::seek(f64::NAN), Err(EventError::InvalidTime(_)));
        assert!(PlaybackEvent::seek(0.0).is_ok());
    }

    #[test]
    fn test_payload_conversion() {
        let payload = SyncPayload::new("heartbeat", 11.3);
        let event = PlaybackEvent::try_from(&payload).unwrap();
        assert_eq!(event, PlaybackEvent::heartbeat(11.3).unwrap());

        let unknown = SyncPayload::new("rewind", 3.0);
        assert_matches!(
            PlaybackEvent::try_from(&unknown),
            Err(EventError::UnknownAction(_))
        );
    }

    #[test]
    fn test_event_into_client_message() {
        let msg: ClientMessage = PlaybackEvent::pause(7.5).unwrap().into();
        assert_eq!(
            msg,
            ClientMessage::PlaybackEvent(SyncPayload::new("pause", 7.5))
        );
    }
}
