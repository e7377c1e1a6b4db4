use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The RBAC tag stored for every account. Serialized as the upper-case tag
/// (`"SCOUT"`), which is also the value persisted in `profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Club,
    Parent,
    Player,
    Scout,
    Agent,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Club,
        Role::Parent,
        Role::Player,
        Role::Scout,
        Role::Agent,
    ];

    /// The upper-case tag, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Club => "CLUB",
            Role::Parent => "PARENT",
            Role::Player => "PLAYER",
            Role::Scout => "SCOUT",
            Role::Agent => "AGENT",
        }
    }

    /// home
    ///
    /// The landing route of the role. Users whose role is not allowed on a
    /// route group are sent here.
    pub fn home(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Club => "/club",
            Role::Parent => "/parent",
            Role::Player => "/player",
            Role::Scout => "/scout",
            Role::Agent => "/agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Stored tags are matched case-insensitively ("scout", " Scout ").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// RouteGroup
///
/// A gated family of dashboard routes sharing one path prefix and one
/// allow-list of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Admin,
    Club,
    Parent,
    Player,
    Scout,
    Agent,
    Talent,
    Vacancies,
}

impl RouteGroup {
    pub const ALL: [RouteGroup; 8] = [
        RouteGroup::Admin,
        RouteGroup::Club,
        RouteGroup::Parent,
        RouteGroup::Player,
        RouteGroup::Scout,
        RouteGroup::Agent,
        RouteGroup::Talent,
        RouteGroup::Vacancies,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            RouteGroup::Admin => "/admin",
            RouteGroup::Club => "/club",
            RouteGroup::Parent => "/parent",
            RouteGroup::Player => "/player",
            RouteGroup::Scout => "/scout",
            RouteGroup::Agent => "/agent",
            RouteGroup::Talent => "/talent",
            RouteGroup::Vacancies => "/vacancies",
        }
    }

    pub const fn allowed(self) -> &'static [Role] {
        match self {
            RouteGroup::Admin => &[Role::Admin],
            RouteGroup::Club => &[Role::Club],
            RouteGroup::Parent => &[Role::Parent],
            RouteGroup::Player => &[Role::Player],
            RouteGroup::Scout => &[Role::Scout],
            RouteGroup::Agent => &[Role::Agent],
            RouteGroup::Talent => &[Role::Scout, Role::Club, Role::Agent],
            RouteGroup::Vacancies => &[Role::Player, Role::Parent, Role::Agent, Role::Club],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed().contains(&role)
    }

    /// for_path
    ///
    /// Resolves the group owning `path`. A path belongs to a group when it is
    /// the prefix itself or continues it with a `/` segment, so `/administrator`
    /// is not part of `/admin`.
    pub fn for_path(path: &str) -> Option<RouteGroup> {
        RouteGroup::ALL.into_iter().find(|group| {
            path.strip_prefix(group.prefix())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// The outcome of checking a session against a route group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// No usable session; send to login and come back to `next` afterwards.
    Login { next: String },
    /// Signed in with a role the group does not admit.
    Redirect(&'static str),
}

/// decide
///
/// The allow-list check run in front of every dashboard group. `requested`
/// is the original path and query, preserved for the login round trip.
pub fn decide(group: RouteGroup, role: Option<Role>, requested: &str) -> Access {
    match role {
        None => Access::Login {
            next: requested.to_string(),
        },
        Some(role) if !group.permits(role) => Access::Redirect(role.home()),
        Some(_) => Access::Allow,
    }
}
