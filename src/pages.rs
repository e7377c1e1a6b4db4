//! Dashboard view models behind the gated route groups.
//!
//! Every handler here runs after `guards::page_guard`, which has already
//! admitted the caller's role and stored its `AuthUser` in the request
//! extensions.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{
        AdminDashboard, ClubDashboard, ParentDashboard, PlayerDashboard, Profile,
        TalentDeskDashboard, TalentSearch, VacancyBoard,
    },
    repository::Repository,
};

async fn own_profile(repo: &dyn Repository, user: AuthUser) -> Result<Profile, AppError> {
    repo.get_profile(user.id)
        .await?
        .ok_or(AppError::NotFound("profile"))
}

pub async fn admin_home(
    Extension(_user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboard>, AppError> {
    Ok(Json(AdminDashboard {
        stats: state.repo.stats().await?,
        users: state.repo.list_users().await?,
    }))
}

pub async fn club_home(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<ClubDashboard>, AppError> {
    Ok(Json(ClubDashboard {
        profile: own_profile(state.repo.as_ref(), user).await?,
        vacancies: state.repo.club_vacancies(user.id).await?,
        shortlist: state.repo.shortlist(user.id).await?,
    }))
}

pub async fn parent_home(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<ParentDashboard>, AppError> {
    Ok(Json(ParentDashboard {
        profile: own_profile(state.repo.as_ref(), user).await?,
        children: state.repo.children(user.id).await?,
        unread_notifications: state.repo.unread_count(user.id).await?,
    }))
}

pub async fn player_home(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<PlayerDashboard>, AppError> {
    Ok(Json(PlayerDashboard {
        profile: own_profile(state.repo.as_ref(), user).await?,
        evaluations: state.repo.evaluations_for_player(user.id).await?,
        open_vacancies: state.repo.list_open_vacancies().await?,
    }))
}

/// Scouts and agents share one desk layout.
pub async fn talent_desk_home(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<TalentDeskDashboard>, AppError> {
    Ok(Json(TalentDeskDashboard {
        profile: own_profile(state.repo.as_ref(), user).await?,
        shortlist: state.repo.shortlist(user.id).await?,
        evaluations_written: state.repo.evaluations_by_author(user.id).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TalentQuery {
    pub position: Option<String>,
}

pub async fn talent_search(
    Extension(_user): Extension<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<TalentQuery>,
) -> Result<Json<TalentSearch>, AppError> {
    let position = query.position.filter(|p| !p.trim().is_empty());
    let players = state.repo.search_players(position.as_deref()).await?;
    Ok(Json(TalentSearch { position, players }))
}

pub async fn vacancy_board(
    Extension(_user): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<VacancyBoard>, AppError> {
    Ok(Json(VacancyBoard {
        vacancies: state.repo.list_open_vacancies().await?,
    }))
}

/// Any unregistered path inside a gated group.
pub async fn unknown_page(Extension(_user): Extension<AuthUser>) -> AppError {
    AppError::NotFound("page")
}
