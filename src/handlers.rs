use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, build_clear_cookie, build_session_cookie, issue_token, verify_token},
    demo::{demo_email, ensure_demo_accounts},
    error::AppError,
    models::{
        AddShortlistRequest, AdminStats, CreateEvaluationRequest, CreateSessionRequest,
        CreateVacancyRequest, DemoAccount, Evaluation, LinkChildRequest, Notification, Profile,
        SessionInfo, ShortlistEntry, UnreadCount, UpdateProfileRequest, UpdateRoleRequest, User,
        Vacancy,
    },
    rbac::{Role, RouteGroup},
    repository::Repository,
    validation::ValidatedJson,
};

/// Seconds the client waits between unread-count polls.
pub const NOTIFICATION_POLL_SECS: u64 = 30;

// Rating players and keeping a shortlist follow the talent pages' allow-list.
const TALENT_SEEKERS: &[Role] = RouteGroup::Talent.allowed();

/// The target of an evaluation, shortlist entry or guardian link must be a player.
async fn require_player(repo: &dyn Repository, id: Uuid) -> Result<User, AppError> {
    repo.get_user(id)
        .await?
        .filter(|user| user.role == Role::Player)
        .ok_or(AppError::NotFound("player"))
}

// --- Session ---

/// create_session
///
/// [Public Route] Exchanges a token issued by the identity provider for the
/// session cookie read by the dashboard guards.
#[utoipa::path(
    post,
    path = "/api/auth/session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session established", body = SessionInfo),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_token(&payload.token, &state.config.jwt_secret)?;
    let user = state
        .repo
        .get_user(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let cookie = build_session_cookie(
        &payload.token,
        state.config.session_ttl_secs,
        state.config.env.is_production(),
    );
    tracing::info!(user_id = %user.id, role = %user.role, "session established");
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionInfo::from(&user))))
}

/// delete_session
///
/// [Public Route] Signs out by expiring the session cookie.
#[utoipa::path(
    delete,
    path = "/api/auth/session",
    responses((status = 204, description = "Session cleared"))
)]
pub async fn delete_session(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = build_clear_cookie(state.config.env.is_production());
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

/// get_me
///
/// [Authenticated Route] The signed-in identity with its stored role and role home.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "No session")
    )
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SessionInfo>, AppError> {
    let user = state
        .repo
        .get_user(auth.id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(SessionInfo::from(&user)))
}

// --- Profiles ---

#[utoipa::path(
    get,
    path = "/api/profile",
    responses((status = 200, description = "Own profile", body = Profile))
)]
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .repo
        .get_profile(auth.id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    Ok(Json(profile))
}

/// update_profile
///
/// [Authenticated Route] Partial update of the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(changes): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .repo
        .update_profile(auth.id, changes)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    Ok(Json(profile))
}

// --- Vacancies ---

#[utoipa::path(
    get,
    path = "/api/vacancies",
    responses((status = 200, description = "Open vacancies", body = [Vacancy]))
)]
pub async fn list_vacancies(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Vacancy>>, AppError> {
    Ok(Json(state.repo.list_open_vacancies().await?))
}

/// create_vacancy
///
/// [Club Route] Posts a vacancy. The body is validated: non-blank title,
/// optional string arrays for positions and age groups.
#[utoipa::path(
    post,
    path = "/api/vacancies",
    request_body = CreateVacancyRequest,
    responses(
        (status = 201, description = "Vacancy posted", body = Vacancy),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not a club")
    )
)]
pub async fn create_vacancy(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateVacancyRequest>,
) -> Result<(StatusCode, Json<Vacancy>), AppError> {
    auth.require(&[Role::Club])?;
    let vacancy = state.repo.create_vacancy(auth.id, payload).await?;
    Ok((StatusCode::CREATED, Json(vacancy)))
}

/// close_vacancy
///
/// [Club Route] Closes one of the caller's own vacancies. Another club's
/// vacancy answers 404.
#[utoipa::path(
    patch,
    path = "/api/vacancies/{id}/close",
    params(("id" = Uuid, Path, description = "Vacancy ID")),
    responses(
        (status = 200, description = "Closed", body = Vacancy),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn close_vacancy(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vacancy>, AppError> {
    auth.require(&[Role::Club])?;
    let vacancy = state
        .repo
        .close_vacancy(id, auth.id)
        .await?
        .ok_or(AppError::NotFound("vacancy"))?;
    Ok(Json(vacancy))
}

// --- Evaluations ---

/// create_evaluation
///
/// [Scout/Club/Agent Route] Rates a player 1..=10 with optional tags.
#[utoipa::path(
    post,
    path = "/api/evaluations",
    request_body = CreateEvaluationRequest,
    responses(
        (status = 201, description = "Evaluation stored", body = Evaluation),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No such player")
    )
)]
pub async fn create_evaluation(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<Evaluation>), AppError> {
    auth.require(TALENT_SEEKERS)?;
    require_player(state.repo.as_ref(), payload.player_id).await?;
    let evaluation = state.repo.create_evaluation(auth.id, payload).await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

#[utoipa::path(
    get,
    path = "/api/players/{id}/evaluations",
    params(("id" = Uuid, Path, description = "Player ID")),
    responses((status = 200, description = "Evaluations of the player", body = [Evaluation]))
)]
pub async fn player_evaluations(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<Vec<Evaluation>>, AppError> {
    require_player(state.repo.as_ref(), player_id).await?;
    Ok(Json(state.repo.evaluations_for_player(player_id).await?))
}

// --- Shortlist ---

#[utoipa::path(
    get,
    path = "/api/shortlist",
    responses((status = 200, description = "Own shortlist", body = [ShortlistEntry]))
)]
pub async fn get_shortlist(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ShortlistEntry>>, AppError> {
    auth.require(TALENT_SEEKERS)?;
    Ok(Json(state.repo.shortlist(auth.id).await?))
}

/// add_to_shortlist
///
/// [Scout/Club/Agent Route] Adding the same player twice answers 409.
#[utoipa::path(
    post,
    path = "/api/shortlist",
    request_body = AddShortlistRequest,
    responses(
        (status = 201, description = "Added", body = ShortlistEntry),
        (status = 409, description = "Already shortlisted")
    )
)]
pub async fn add_to_shortlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AddShortlistRequest>,
) -> Result<(StatusCode, Json<ShortlistEntry>), AppError> {
    auth.require(TALENT_SEEKERS)?;
    require_player(state.repo.as_ref(), payload.player_id).await?;
    let entry = state.repo.add_to_shortlist(auth.id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/api/shortlist/{player_id}",
    params(("player_id" = Uuid, Path, description = "Player ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not on the shortlist")
    )
)]
pub async fn remove_from_shortlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(TALENT_SEEKERS)?;
    if state.repo.remove_from_shortlist(auth.id, player_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("shortlist entry"))
    }
}

// --- Families ---

/// link_child
///
/// [Parent Route] Associates a player with the calling parent.
#[utoipa::path(
    post,
    path = "/api/parent/children",
    request_body = LinkChildRequest,
    responses(
        (status = 201, description = "Linked"),
        (status = 409, description = "Already linked")
    )
)]
pub async fn link_child(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<LinkChildRequest>,
) -> Result<StatusCode, AppError> {
    auth.require(&[Role::Parent])?;
    require_player(state.repo.as_ref(), payload.player_id).await?;
    if state.repo.link_child(auth.id, payload.player_id).await? {
        Ok(StatusCode::CREATED)
    } else {
        Err(AppError::Conflict("player is already linked".to_string()))
    }
}

// --- Notifications ---

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Own notifications", body = [Notification]))
)]
pub async fn get_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.repo.notifications(auth.id).await?))
}

/// unread_count
///
/// [Authenticated Route] Polled by the client every `poll_after_secs` seconds.
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses((status = 200, description = "Unread count", body = UnreadCount))
)]
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCount>, AppError> {
    let unread = state.repo.unread_count(auth.id).await?;
    Ok(Json(UnreadCount {
        unread,
        poll_after_secs: NOTIFICATION_POLL_SECS,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn mark_notification_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.repo.mark_notification_read(id, auth.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("notification"))
    }
}

// --- Moderation ---

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform counters", body = AdminStats),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, AppError> {
    auth.require(&[Role::Admin])?;
    Ok(Json(state.repo.stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All accounts", body = [User]))
)]
pub async fn admin_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require(&[Role::Admin])?;
    Ok(Json(state.repo.list_users().await?))
}

/// admin_set_role
///
/// [Admin Route] Changes the stored role of an account. The change applies to
/// that account's next request. Administrators cannot change their own role.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "No such user")
    )
)]
pub async fn admin_set_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, AppError> {
    auth.require(&[Role::Admin])?;
    if id == auth.id {
        return Err(AppError::Forbidden(
            "administrators cannot change their own role".to_string(),
        ));
    }
    let user = state
        .repo
        .set_user_role(id, payload.role)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    tracing::info!(admin_id = %auth.id, user_id = %user.id, role = %user.role, "role changed");
    Ok(Json(user))
}

/// admin_remove_vacancy
///
/// [Admin Route] Moderation removal of any vacancy; the owning club is notified.
#[utoipa::path(
    delete,
    path = "/api/admin/vacancies/{id}",
    params(("id" = Uuid, Path, description = "Vacancy ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_remove_vacancy(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(&[Role::Admin])?;
    if state.repo.remove_vacancy(id, auth.id).await? {
        tracing::info!(admin_id = %auth.id, vacancy_id = %id, "vacancy removed by moderation");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("vacancy"))
    }
}

// --- Demo ---

/// demo_accounts
///
/// [Demo Route] One ready-made account per role.
#[utoipa::path(
    get,
    path = "/demo",
    responses(
        (status = 200, description = "Demo accounts", body = [DemoAccount]),
        (status = 404, description = "Hidden in production")
    )
)]
pub async fn demo_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DemoAccount>>, AppError> {
    Ok(Json(ensure_demo_accounts(state.repo.as_ref()).await?))
}

/// demo_session
///
/// [Demo Route] Signs in as the demo account of `role` by issuing a session
/// token and cookie.
#[utoipa::path(
    post,
    path = "/demo/session/{role}",
    params(("role" = String, Path, description = "Role tag, e.g. SCOUT")),
    responses(
        (status = 200, description = "Signed in", body = SessionInfo),
        (status = 404, description = "Unknown role, or hidden in production")
    )
)]
pub async fn demo_session(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let role: Role = role.parse().map_err(|_| AppError::NotFound("role"))?;
    ensure_demo_accounts(state.repo.as_ref()).await?;
    let user = state
        .repo
        .find_user_by_email(&demo_email(role))
        .await?
        .ok_or(AppError::NotFound("demo account"))?;

    let token = issue_token(user.id, &state.config.jwt_secret, state.config.session_ttl_secs)?;
    let cookie = build_session_cookie(
        &token,
        state.config.session_ttl_secs,
        state.config.env.is_production(),
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionInfo::from(&user))))
}
