//! Local leader/follower role
//!
//! The role is chosen by the local user and never leaves this process. A
//! leader emits its controls and heartbeats; a follower corrects drift.
//! Nothing stops two clients from both being leader.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Playback role of this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Leader,
    #[default]
    Follower,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader)
    }

    pub fn other(&self) -> Role {
        match self {
            Role::Leader => Role::Follower,
            Role::Follower => Role::Leader,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name that is neither leader nor follower
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role '{0}', expected leader or follower")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leader" => Ok(Role::Leader),
            "follower" => Ok(Role::Follower),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Outcome of a role change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTransition {
    Unchanged,
    BecameLeader,
    BecameFollower,
}

/// Current role plus the transitions between roles
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleState {
    role: Role,
}

impl RoleState {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_leader(&self) -> bool {
        self.role.is_leader()
    }

    /// Switch to `role`
    pub fn set(&mut self, role: Role) -> RoleTransition {
        if self.role == role {
            return RoleTransition::Unchanged;
        }
        self.role = role;
        match role {
            Role::Leader => RoleTransition::BecameLeader,
            Role::Follower => RoleTransition::BecameFollower,
        }
    }

    pub fn toggle(&mut self) -> RoleTransition {
        self.set(self.role.other())
    }
}
