use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
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

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    vacancies: Vec<Vacancy>,
    evaluations: Vec<Evaluation>,
    shortlist: Vec<ShortlistEntry>,
    guardian_links: Vec<(Uuid, Uuid)>,
    notifications: Vec<Notification>,
}

impl Store {
    fn notify(&mut self, user_id: Uuid, actor_id: Uuid, kind: NotificationKind, subject_id: Uuid) {
        self.notifications.push(Notification {
            id: Uuid::new_v4(),
            user_id,
            actor_id,
            kind,
            subject_id,
            is_read: false,
            created_at: Utc::now(),
        });
    }
}

/// MemoryRepository
///
/// Process-local store used when no `DATABASE_URL` is configured in the local
/// environment, and by the test suites. Lists come back newest first, as the
/// Postgres store orders them.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.email.eq_ignore_ascii_case(&new.email)) {
            return Err(AppError::Conflict(format!("{} is already registered", new.email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            role: new.role,
            display_name: new.display_name,
            created_at: Utc::now(),
        };
        store.profiles.insert(user.id, Profile::empty(&user));
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(newest_first(store.users.values().cloned(), |u| u.created_at))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let mut store = self.store.write().await;
        let Some(user) = store.users.get_mut(&id) else {
            return Ok(None);
        };
        user.role = role;
        let user = user.clone();
        if let Some(profile) = store.profiles.get_mut(&id) {
            profile.role = role;
        }
        Ok(Some(user))
    }

    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Option<Profile>> {
        Ok(self.store.read().await.profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<Profile>> {
        let mut store = self.store.write().await;
        let Some(profile) = store.profiles.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.display_name {
            profile.display_name = Some(name);
        }
        if let Some(position) = changes.position {
            profile.position = Some(position);
        }
        if let Some(year) = changes.birth_year {
            profile.birth_year = Some(year);
        }
        if let Some(club) = changes.club_name {
            profile.club_name = Some(club);
        }
        if let Some(bio) = changes.bio {
            profile.bio = Some(bio);
        }
        profile.updated_at = Utc::now();
        let profile = profile.clone();
        if let Some(user) = store.users.get_mut(&user_id) {
            user.display_name = profile.display_name.clone();
        }
        Ok(Some(profile))
    }

    async fn search_players(&self, position: Option<&str>) -> RepoResult<Vec<Profile>> {
        let store = self.store.read().await;
        let players = store.profiles.values().filter(|p| p.role == Role::Player).filter(|p| {
            match (position, p.position.as_deref()) {
                (None, _) => true,
                (Some(wanted), Some(actual)) => actual.eq_ignore_ascii_case(wanted),
                (Some(_), None) => false,
            }
        });
        Ok(newest_first(players.cloned(), |p| p.updated_at))
    }

    async fn list_open_vacancies(&self) -> RepoResult<Vec<Vacancy>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.vacancies.iter().filter(|v| v.is_open).cloned(),
            |v| v.created_at,
        ))
    }

    async fn club_vacancies(&self, club_id: Uuid) -> RepoResult<Vec<Vacancy>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.vacancies.iter().filter(|v| v.club_id == club_id).cloned(),
            |v| v.created_at,
        ))
    }

    async fn create_vacancy(
        &self,
        club_id: Uuid,
        req: CreateVacancyRequest,
    ) -> RepoResult<Vacancy> {
        let vacancy = Vacancy {
            id: Uuid::new_v4(),
            club_id,
            title: req.title.trim().to_string(),
            description: req.description,
            positions: req.positions.unwrap_or_default(),
            age_groups: req.age_groups.unwrap_or_default(),
            is_open: true,
            created_at: Utc::now(),
        };
        self.store.write().await.vacancies.push(vacancy.clone());
        Ok(vacancy)
    }

    async fn close_vacancy(&self, id: Uuid, club_id: Uuid) -> RepoResult<Option<Vacancy>> {
        let mut store = self.store.write().await;
        Ok(store
            .vacancies
            .iter_mut()
            .find(|v| v.id == id && v.club_id == club_id)
            .map(|v| {
                v.is_open = false;
                v.clone()
            }))
    }

    async fn remove_vacancy(&self, id: Uuid, moderator_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let Some(index) = store.vacancies.iter().position(|v| v.id == id) else {
            return Ok(false);
        };
        let removed = store.vacancies.remove(index);
        store.notify(removed.club_id, moderator_id, NotificationKind::VacancyRemoved, removed.id);
        Ok(true)
    }

    async fn create_evaluation(
        &self,
        author_id: Uuid,
        req: CreateEvaluationRequest,
    ) -> RepoResult<Evaluation> {
        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            author_id,
            player_id: req.player_id,
            rating: req.rating,
            comment: req.comment,
            tags: req.tags.unwrap_or_default(),
            created_at: Utc::now(),
        };
        let mut store = self.store.write().await;
        store.evaluations.push(evaluation.clone());
        store.notify(evaluation.player_id, author_id, NotificationKind::Evaluation, evaluation.id);
        Ok(evaluation)
    }

    async fn evaluations_for_player(&self, player_id: Uuid) -> RepoResult<Vec<Evaluation>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.evaluations.iter().filter(|e| e.player_id == player_id).cloned(),
            |e| e.created_at,
        ))
    }

    async fn evaluations_by_author(&self, author_id: Uuid) -> RepoResult<Vec<Evaluation>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.evaluations.iter().filter(|e| e.author_id == author_id).cloned(),
            |e| e.created_at,
        ))
    }

    async fn shortlist(&self, owner_id: Uuid) -> RepoResult<Vec<ShortlistEntry>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.shortlist.iter().filter(|s| s.owner_id == owner_id).cloned(),
            |s| s.created_at,
        ))
    }

    async fn add_to_shortlist(
        &self,
        owner_id: Uuid,
        req: AddShortlistRequest,
    ) -> RepoResult<ShortlistEntry> {
        let mut store = self.store.write().await;
        if store
            .shortlist
            .iter()
            .any(|s| s.owner_id == owner_id && s.player_id == req.player_id)
        {
            return Err(AppError::Conflict("player is already shortlisted".to_string()));
        }
        let entry = ShortlistEntry {
            owner_id,
            player_id: req.player_id,
            note: req.note,
            created_at: Utc::now(),
        };
        store.shortlist.push(entry.clone());
        store.notify(entry.player_id, owner_id, NotificationKind::Shortlist, entry.player_id);
        Ok(entry)
    }

    async fn remove_from_shortlist(&self, owner_id: Uuid, player_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.shortlist.len();
        store
            .shortlist
            .retain(|s| !(s.owner_id == owner_id && s.player_id == player_id));
        Ok(store.shortlist.len() < before)
    }

    async fn link_child(&self, parent_id: Uuid, player_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        if store.guardian_links.contains(&(parent_id, player_id)) {
            return Ok(false);
        }
        store.guardian_links.push((parent_id, player_id));
        Ok(true)
    }

    async fn children(&self, parent_id: Uuid) -> RepoResult<Vec<Profile>> {
        let store = self.store.read().await;
        Ok(store
            .guardian_links
            .iter()
            .filter(|(parent, _)| *parent == parent_id)
            .filter_map(|(_, player)| store.profiles.get(player).cloned())
            .collect())
    }

    async fn notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.notifications.iter().filter(|n| n.user_id == user_id).cloned(),
            |n| n.created_at,
        ))
    }

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        let store = self.store.read().await;
        let unread = store
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(unread as i64)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        match store
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> RepoResult<AdminStats> {
        let store = self.store.read().await;
        let users_by_role = Role::ALL
            .into_iter()
            .map(|role| RoleCount {
                role,
                count: store.users.values().filter(|u| u.role == role).count() as i64,
            })
            .collect();
        Ok(AdminStats {
            total_users: store.users.len() as i64,
            users_by_role,
            open_vacancies: store.vacancies.iter().filter(|v| v.is_open).count() as i64,
            evaluations: store.evaluations.len() as i64,
            shortlist_entries: store.shortlist.len() as i64,
        })
    }
}
