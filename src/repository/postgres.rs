use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{NewUser, RepoResult, Repository};
use crate::{
    error::AppError,
    models::{
        AddShortlistRequest, AdminStats, CreateEvaluationRequest, CreateVacancyRequest,
        Evaluation, Notification, NotificationKind, Profile, RoleCount, ShortlistEntry,
        UpdateProfileRequest, User, Vacancy,
    },
    rbac::Role,
};

const USER_COLUMNS: &str = "id, email, role, display_name, created_at";
const PROFILE_COLUMNS: &str =
    "id, role, display_name, position, birth_year, club_name, bio, updated_at";
const VACANCY_COLUMNS: &str =
    "id, club_id, title, description, positions, age_groups, is_open, created_at";
const EVALUATION_COLUMNS: &str = "id, author_id, player_id, rating, comment, tags, created_at";

// Roles and notification kinds are stored as text; rows are decoded here and
// converted into the typed models.

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

fn stored_role(tag: &str) -> RepoResult<Role> {
    tag.parse()
        .map_err(|e| AppError::Internal(format!("corrupt profile row: {e}")))
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            role: stored_role(&row.role)?,
            display_name: row.display_name,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    role: String,
    display_name: Option<String>,
    position: Option<String>,
    birth_year: Option<i32>,
    club_name: Option<String>,
    bio: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: row.id,
            role: stored_role(&row.role)?,
            display_name: row.display_name,
            position: row.position,
            birth_year: row.birth_year,
            club_name: row.club_name,
            bio: row.bio,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct VacancyRow {
    id: Uuid,
    club_id: Uuid,
    title: String,
    description: Option<String>,
    positions: Vec<String>,
    age_groups: Vec<String>,
    is_open: bool,
    created_at: DateTime<Utc>,
}

impl From<VacancyRow> for Vacancy {
    fn from(row: VacancyRow) -> Self {
        Vacancy {
            id: row.id,
            club_id: row.club_id,
            title: row.title,
            description: row.description,
            positions: row.positions,
            age_groups: row.age_groups,
            is_open: row.is_open,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct EvaluationRow {
    id: Uuid,
    author_id: Uuid,
    player_id: Uuid,
    rating: i32,
    comment: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<EvaluationRow> for Evaluation {
    fn from(row: EvaluationRow) -> Self {
        Evaluation {
            id: row.id,
            author_id: row.author_id,
            player_id: row.player_id,
            rating: row.rating,
            comment: row.comment,
            tags: row.tags,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ShortlistRow {
    owner_id: Uuid,
    player_id: Uuid,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ShortlistRow> for ShortlistEntry {
    fn from(row: ShortlistRow) -> Self {
        ShortlistEntry {
            owner_id: row.owner_id,
            player_id: row.player_id,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    actor_id: Uuid,
    kind: String,
    subject_id: Uuid,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = NotificationKind::parse(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown notification kind {}", row.kind)))?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            actor_id: row.actor_id,
            kind,
            subject_id: row.subject_id,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> RepoResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// PostgresRepository
///
/// The production store. Queries are built at runtime (`query_as::<_, Row>`)
/// so the crate compiles without a reachable database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations. Called once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

async fn insert_notification<'e, E>(
    executor: E,
    user_id: Uuid,
    actor_id: Uuid,
    kind: NotificationKind,
    subject_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        "INSERT INTO notifications (id, user_id, actor_id, kind, subject_id) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(actor_id)
    .bind(kind.as_str())
    .bind(subject_id)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO profiles (id, email, role, display_name) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(new.role.as_str())
        .bind(&new.display_name)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::Conflict(format!("{} is already registered", new.email))),
        }
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Profile::try_from).transpose()
    }

    /// COALESCE keeps every column whose field was absent from the request.
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles
            SET display_name = COALESCE($2, display_name),
                position = COALESCE($3, position),
                birth_year = COALESCE($4, birth_year),
                club_name = COALESCE($5, club_name),
                bio = COALESCE($6, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.display_name)
        .bind(changes.position)
        .bind(changes.birth_year)
        .bind(changes.club_name)
        .bind(changes.bio)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn search_players(&self, position: Option<&str>) -> RepoResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles \
             WHERE role = 'PLAYER' AND ($1::TEXT IS NULL OR LOWER(position) = LOWER($1)) \
             ORDER BY updated_at DESC"
        ))
        .bind(position)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_open_vacancies(&self) -> RepoResult<Vec<Vacancy>> {
        let rows = sqlx::query_as::<_, VacancyRow>(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies WHERE is_open ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vacancy::from).collect())
    }

    async fn club_vacancies(&self, club_id: Uuid) -> RepoResult<Vec<Vacancy>> {
        let rows = sqlx::query_as::<_, VacancyRow>(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies WHERE club_id = $1 ORDER BY created_at DESC"
        ))
        .bind(club_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vacancy::from).collect())
    }

    async fn create_vacancy(
        &self,
        club_id: Uuid,
        req: CreateVacancyRequest,
    ) -> RepoResult<Vacancy> {
        let row = sqlx::query_as::<_, VacancyRow>(&format!(
            "INSERT INTO vacancies (id, club_id, title, description, positions, age_groups) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VACANCY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(club_id)
        .bind(req.title.trim())
        .bind(req.description)
        .bind(req.positions.unwrap_or_default())
        .bind(req.age_groups.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn close_vacancy(&self, id: Uuid, club_id: Uuid) -> RepoResult<Option<Vacancy>> {
        let row = sqlx::query_as::<_, VacancyRow>(&format!(
            "UPDATE vacancies SET is_open = FALSE WHERE id = $1 AND club_id = $2 RETURNING {VACANCY_COLUMNS}"
        ))
        .bind(id)
        .bind(club_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vacancy::from))
    }

    async fn remove_vacancy(&self, id: Uuid, moderator_id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;
        let club_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM vacancies WHERE id = $1 RETURNING club_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(club_id) = club_id else {
            return Ok(false);
        };
        insert_notification(&mut *tx, club_id, moderator_id, NotificationKind::VacancyRemoved, id)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn create_evaluation(
        &self,
        author_id: Uuid,
        req: CreateEvaluationRequest,
    ) -> RepoResult<Evaluation> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            "INSERT INTO evaluations (id, author_id, player_id, rating, comment, tags) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {EVALUATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(req.player_id)
        .bind(req.rating)
        .bind(req.comment)
        .bind(req.tags.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;
        insert_notification(
            &mut *tx,
            row.player_id,
            author_id,
            NotificationKind::Evaluation,
            row.id,
        )
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn evaluations_for_player(&self, player_id: Uuid) -> RepoResult<Vec<Evaluation>> {
        let rows = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE player_id = $1 ORDER BY created_at DESC"
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Evaluation::from).collect())
    }

    async fn evaluations_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Evaluation>> {
        let rows = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE author_id = $1 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Evaluation::from).collect())
    }

    async fn shortlist(&self, owner_id: Uuid) -> RepoResult<Vec<ShortlistEntry>> {
        let rows = sqlx::query_as::<_, ShortlistRow>(
            "SELECT owner_id, player_id, note, created_at FROM shortlist_entries \
             WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ShortlistEntry::from).collect())
    }

    /// The composite primary key makes a repeated add a no-op, reported as a conflict.
    async fn add_to_shortlist(
        &self,
        owner_id: Uuid,
        req: AddShortlistRequest,
    ) -> RepoResult<ShortlistEntry> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ShortlistRow>(
            "INSERT INTO shortlist_entries (owner_id, player_id, note) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING RETURNING owner_id, player_id, note, created_at",
        )
        .bind(owner_id)
        .bind(req.player_id)
        .bind(req.note)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(AppError::Conflict("player is already shortlisted".to_string()));
        };
        insert_notification(
            &mut *tx,
            row.player_id,
            owner_id,
            NotificationKind::Shortlist,
            row.player_id,
        )
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn remove_from_shortlist(&self, owner_id: Uuid, player_id: Uuid) -> RepoResult<bool> {
        let result =
            sqlx::query("DELETE FROM shortlist_entries WHERE owner_id = $1 AND player_id = $2")
                .bind(owner_id)
                .bind(player_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_child(&self, parent_id: Uuid, player_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO guardian_links (parent_id, player_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(parent_id)
        .bind(player_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn children(&self, parent_id: Uuid) -> RepoResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT p.id, p.role, p.display_name, p.position, p.birth_year, p.club_name, p.bio, p.updated_at \
             FROM guardian_links g JOIN profiles p ON p.id = g.player_id \
             WHERE g.parent_id = $1 ORDER BY p.display_name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, user_id, actor_id, kind, subject_id, is_read, created_at \
             FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> RepoResult<AdminStats> {
        let by_role: Vec<(String, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM profiles GROUP BY role")
                .fetch_all(&self.pool)
                .await?;
        let (open_vacancies, evaluations, shortlist_entries): (i64, i64, i64) = sqlx::query_as(
            "SELECT \
               (SELECT COUNT(*) FROM vacancies WHERE is_open), \
               (SELECT COUNT(*) FROM evaluations), \
               (SELECT COUNT(*) FROM shortlist_entries)",
        )
        .fetch_one(&self.pool)
        .await?;

        let users_by_role: Vec<RoleCount> = Role::ALL
            .into_iter()
            .map(|role| RoleCount {
                role,
                count: by_role
                    .iter()
                    .find(|(tag, _)| tag == role.as_str())
                    .map_or(0, |(_, count)| *count),
            })
            .collect();

        Ok(AdminStats {
            total_users: users_by_role.iter().map(|r| r.count).sum(),
            users_by_role,
            open_vacancies,
            evaluations,
            shortlist_entries,
        })
    }
}
