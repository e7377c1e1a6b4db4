use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        AddShortlistRequest, AdminStats, CreateEvaluationRequest, CreateVacancyRequest,
        Evaluation, Notification, Profile, ShortlistEntry, UpdateProfileRequest, User, Vacancy,
    },
    rbac::Role,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

pub type RepoResult<T> = Result<T, AppError>;

/// NewUser
///
/// Input for account creation. Accounts are provisioned by the identity
/// provider; this service only mirrors them (and seeds the demo accounts).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub role: Role,
    pub display_name: Option<String>,
}

/// Repository
///
/// The persistence contract behind every handler and guard. Handlers hold an
/// `Arc<dyn Repository>`, so the Postgres store and the in-memory store are
/// interchangeable.
///
/// Ownership rules (club closes only its own vacancy, user marks only its own
/// notification) are enforced here: a non-owner sees `None` / `false`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;

    // --- Profiles ---
    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Option<Profile>>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<Profile>>;
    // Player profiles, optionally narrowed to one position (case-insensitive).
    async fn search_players(&self, position: Option<&str>) -> RepoResult<Vec<Profile>>;

    // --- Vacancies ---
    async fn list_open_vacancies(&self) -> RepoResult<Vec<Vacancy>>;
    async fn club_vacancies(&self, club_id: Uuid) -> RepoResult<Vec<Vacancy>>;
    async fn create_vacancy(&self, club_id: Uuid, req: CreateVacancyRequest)
    -> RepoResult<Vacancy>;
    // Owner-only: `None` when the vacancy does not exist or belongs to another club.
    async fn close_vacancy(&self, id: Uuid, club_id: Uuid) -> RepoResult<Option<Vacancy>>;
    // Moderation: removes any vacancy and notifies its club.
    async fn remove_vacancy(&self, id: Uuid, moderator_id: Uuid) -> RepoResult<bool>;

    // --- Evaluations ---
    // Also notifies the rated player.
    async fn create_evaluation(
        &self,
        author_id: Uuid,
        req: CreateEvaluationRequest,
    ) -> RepoResult<Evaluation>;
    async fn evaluations_for_player(&self, player_id: Uuid) -> RepoResult<Vec<Evaluation>>;
    async fn evaluations_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Evaluation>>;

    // --- Shortlists ---
    async fn shortlist(&self, owner_id: Uuid) -> RepoResult<Vec<ShortlistEntry>>;
    // `AppError::Conflict` when the player is already on the owner's shortlist.
    async fn add_to_shortlist(
        &self,
        owner_id: Uuid,
        req: AddShortlistRequest,
    ) -> RepoResult<ShortlistEntry>;
    async fn remove_from_shortlist(&self, owner_id: Uuid, player_id: Uuid) -> RepoResult<bool>;

    // --- Families ---
    // Returns false when the link already exists.
    async fn link_child(&self, parent_id: Uuid, player_id: Uuid) -> RepoResult<bool>;
    async fn children(&self, parent_id: Uuid) -> RepoResult<Vec<Profile>>;

    // --- Notifications ---
    async fn notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>>;
    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64>;
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    // --- Moderation ---
    async fn stats(&self) -> RepoResult<AdminStats>;
}

pub type RepositoryState = Arc<dyn Repository>;
