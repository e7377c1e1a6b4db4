mod common;

use atmosfera::{Role, RouteGroup, config::Env, repository::Repository};
use axum::http::StatusCode;
use common::{get, get_as, get_with_cookie, location, test_app};
use tower::ServiceExt;

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login_with_next() {
    let app = test_app(Env::Local);

    for group in RouteGroup::ALL {
        let response = app.router.clone().oneshot(get(group.prefix())).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let expected = format!("/login?next={}", urlencoding::encode(group.prefix()));
        assert_eq!(location(&response), expected);
    }
}

#[tokio::test]
async fn login_redirect_keeps_the_query_string() {
    let app = test_app(Env::Local);

    let response = app
        .router
        .oneshot(get("/talent?position=goalie&age=U18"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/login?next=%2Ftalent%3Fposition%3Dgoalie%26age%3DU18"
    );
}

#[tokio::test]
async fn every_role_is_admitted_or_sent_home() {
    let app = test_app(Env::Local);

    for role in Role::ALL {
        let user = app.user(role).await;
        for group in RouteGroup::ALL {
            let response = app
                .router
                .clone()
                .oneshot(get_as(group.prefix(), &user))
                .await
                .unwrap();

            if group.permits(role) {
                assert_eq!(
                    response.status(),
                    StatusCode::OK,
                    "{role} should be admitted to {}",
                    group.prefix()
                );
            } else {
                assert_eq!(
                    response.status(),
                    StatusCode::TEMPORARY_REDIRECT,
                    "{role} should be turned away from {}",
                    group.prefix()
                );
                assert_eq!(location(&response), role.home());
            }
        }
    }
}

#[tokio::test]
async fn talent_pages_admit_scouts_clubs_and_agents_only() {
    let app = test_app(Env::Local);

    for role in [Role::Scout, Role::Club, Role::Agent] {
        let user = app.user(role).await;
        let response = app
            .router
            .clone()
            .oneshot(get_as("/talent?position=goalie", &user))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let player = app.user(Role::Player).await;
    let response = app
        .router
        .clone()
        .oneshot(get_as("/talent", &player))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/player");
}

#[tokio::test]
async fn unknown_pages_inside_a_group_are_guarded_before_the_404() {
    let app = test_app(Env::Local);

    let response = app
        .router
        .clone()
        .oneshot(get("/admin/settings"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?next=%2Fadmin%2Fsettings");

    let scout = app.user(Role::Scout).await;
    let response = app
        .router
        .clone()
        .oneshot(get_as("/admin/settings", &scout))
        .await
        .unwrap();
    assert_eq!(location(&response), "/scout");

    let admin = app.user(Role::Admin).await;
    let response = app
        .router
        .oneshot(get_as("/admin/settings", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trailing_slash_group_roots_are_guarded() {
    let app = test_app(Env::Local);

    for group in RouteGroup::ALL {
        let path = format!("{}/", group.prefix());
        let response = app.router.clone().oneshot(get(&path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(
            location(&response),
            format!("/login?next={}", urlencoding::encode(&path))
        );
    }

    let scout = app.user(Role::Scout).await;
    for path in ["/admin/", "/vacancies/"] {
        let response = app
            .router
            .clone()
            .oneshot(get_as(path, &scout))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "/scout");
    }

    let admin = app.user(Role::Admin).await;
    let response = app
        .router
        .oneshot(get_as("/admin/", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_cookie_is_accepted_by_the_guard() {
    let app = test_app(Env::Production);
    let club = app.user(Role::Club).await;
    let token = app.token(&club);

    let response = app
        .router
        .clone()
        .oneshot(get_with_cookie("/club", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(get_with_cookie("/parent", &token))
        .await
        .unwrap();
    assert_eq!(location(&response), "/club");
}

#[tokio::test]
async fn forged_or_bypass_sessions_are_treated_as_anonymous_in_production() {
    let app = test_app(Env::Production);
    let admin = app.user(Role::Admin).await;

    // The x-user-id bypass is local-only.
    let response = app
        .router
        .clone()
        .oneshot(get_as("/admin", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?next=%2Fadmin");

    let response = app
        .router
        .oneshot(get_with_cookie("/admin", "not-a-token"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login?next=%2Fadmin");
}

#[tokio::test]
async fn role_changes_apply_on_the_next_request() {
    let app = test_app(Env::Local);
    let user = app.user(Role::Player).await;

    let response = app
        .router
        .clone()
        .oneshot(get_as("/scout", &user))
        .await
        .unwrap();
    assert_eq!(location(&response), "/player");

    app.repo.set_user_role(user.id, Role::Scout).await.unwrap();

    let response = app
        .router
        .oneshot(get_as("/scout", &user))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_entry_sends_users_to_their_home() {
    let app = test_app(Env::Local);

    let response = app.router.clone().oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?next=%2Fdashboard");

    let response = app
        .router
        .clone()
        .oneshot(get("/dashboard?tab=inbox"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login?next=%2Fdashboard%3Ftab%3Dinbox");

    let agent = app.user(Role::Agent).await;
    let response = app
        .router
        .oneshot(get_as("/dashboard", &agent))
        .await
        .unwrap();
    assert_eq!(location(&response), "/agent");
}

#[tokio::test]
async fn paths_outside_the_groups_are_not_guarded() {
    let app = test_app(Env::Local);

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Prefix match is per segment: "/administration" is not the admin group.
    let response = app.router.oneshot(get("/administration")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
