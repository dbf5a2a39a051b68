//! User-visible client status

use std::fmt;

use crate::attachment::Readiness;
use crate::connection::LinkState;
use crate::role::Role;

/// Snapshot published on every link, attachment or role transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub link: LinkState,
    pub media: Readiness,
    pub role: Role,
}

impl Status {
    pub fn new(role: Role) -> Self {
        Self {
            link: LinkState::Connecting,
            media: Readiness::Pending,
            role,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = match &self.link {
            LinkState::Connecting => "connecting".to_string(),
            LinkState::Connected { session_id } => format!("connected as {}", session_id),
            LinkState::Reconnecting { attempt } => format!("reconnecting (attempt {})", attempt),
            LinkState::Disconnected => "disconnected".to_string(),
        };
        let media = match &self.media {
            Readiness::Pending => "attaching".to_string(),
            Readiness::Ready => "attached".to_string(),
            Readiness::Failed(reason) => format!("failed: {}", reason),
        };
        write!(f, "{} | link: {} | media: {}", self.role, link, media)
    }
}
