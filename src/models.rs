use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::rbac::Role;

// --- Core Records ---

/// User
///
/// The account record behind a session. `role` is the stored RBAC tag read by
/// the route guards on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Profile
///
/// The editable public card of an account. For players it carries the
/// hockey-specific fields scouts and clubs search on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub user_id: Uuid,
    pub role: Role,
    pub display_name: Option<String>,
    // e.g. "goalie", "defense", "forward"
    pub position: Option<String>,
    pub birth_year: Option<i32>,
    pub club_name: Option<String>,
    pub bio: Option<String>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn empty(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            display_name: user.display_name.clone(),
            position: None,
            birth_year: None,
            club_name: None,
            bio: None,
            updated_at: user.created_at,
        }
    }
}

/// Vacancy
///
/// An open spot posted by a club. Only the owning club may close it; admins
/// may remove it during moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Vacancy {
    pub id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub positions: Vec<String>,
    pub age_groups: Vec<String>,
    pub is_open: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Evaluation
///
/// A 1..=10 rating of a player written by a scout, club or agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Evaluation {
    pub id: Uuid,
    pub author_id: Uuid,
    pub player_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ShortlistEntry
///
/// A player tracked by a scout, club or agent. Unique per (owner, player).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShortlistEntry {
    pub owner_id: Uuid,
    pub player_id: Uuid,
    pub note: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationKind {
    Evaluation,
    Shortlist,
    VacancyRemoved,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Evaluation => "evaluation",
            NotificationKind::Shortlist => "shortlist",
            NotificationKind::VacancyRemoved => "vacancy_removed",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "evaluation" => Some(NotificationKind::Evaluation),
            "shortlist" => Some(NotificationKind::Shortlist),
            "vacancy_removed" => Some(NotificationKind::VacancyRemoved),
            _ => None,
        }
    }
}

/// Notification
///
/// Addressed to `user_id`, caused by `actor_id`. `subject_id` points at the
/// evaluation, player or vacancy the notification is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub subject_id: Uuid,
    pub is_read: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads ---

/// CreateSessionRequest
///
/// Exchanges a bearer token for the HttpOnly session cookie read by the page guards.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateSessionRequest {
    pub token: String,
}

/// CreateEvaluationRequest
///
/// `rating` must lie in 1..=10; `tags`, when present, must be an array of
/// non-blank strings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateEvaluationRequest {
    pub player_id: Uuid,
    #[schema(minimum = 1, maximum = 10, example = 8)]
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// CreateVacancyRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateVacancyRequest {
    #[schema(example = "U18 goaltender")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub positions: Option<Vec<String>>,
    #[serde(default)]
    pub age_groups: Option<Vec<String>>,
}

/// UpdateProfileRequest
///
/// Partial update: only fields that are present are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AddShortlistRequest {
    pub player_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LinkChildRequest {
    pub player_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

// --- Responses ---

/// SessionInfo
///
/// What the client needs to route itself: who is signed in, with which role,
/// and where that role lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub home: String,
}

impl From<&User> for SessionInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            home: user.role.home().to_string(),
        }
    }
}

/// UnreadCount
///
/// Polled by the header badge. The client waits `poll_after_secs` before asking again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UnreadCount {
    pub unread: i64,
    pub poll_after_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

/// AdminStats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub users_by_role: Vec<RoleCount>,
    pub open_vacancies: i64,
    pub evaluations: i64,
    pub shortlist_entries: i64,
}

/// DemoAccount
///
/// A seeded account per role, offered by the `/demo` switcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DemoAccount {
    pub role: Role,
    pub email: String,
    pub user_id: Uuid,
    pub home: String,
}

// --- Dashboard View Models ---

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClubDashboard {
    pub profile: Profile,
    pub vacancies: Vec<Vacancy>,
    pub shortlist: Vec<ShortlistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParentDashboard {
    pub profile: Profile,
    pub children: Vec<Profile>,
    pub unread_notifications: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerDashboard {
    pub profile: Profile,
    pub evaluations: Vec<Evaluation>,
    pub open_vacancies: Vec<Vacancy>,
}

/// Shared by scouts and agents: both work from a shortlist.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TalentDeskDashboard {
    pub profile: Profile,
    pub shortlist: Vec<ShortlistEntry>,
    pub evaluations_written: Vec<Evaluation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TalentSearch {
    pub position: Option<String>,
    pub players: Vec<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VacancyBoard {
    pub vacancies: Vec<Vacancy>,
}
