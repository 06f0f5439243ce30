mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, FlowContext, course_path, create_course_action, create_lesson_action, seed_admin,
    setup_server, setup_test_db, signin_action, signin_admin_action, signup_action,
};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid JSON format")
}

fn lesson_path(lesson_key: &'static str) -> impl Fn(&FlowContext) -> String + Send + Sync + 'static {
    move |ctx| {
        let id = ctx.get(lesson_key)["id"].as_str().expect("lesson id").to_string();
        format!("/api/v1/lessons/{id}")
    }
}

#[tokio::test]
async fn route_course_representation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher"))
        .step(
            create_course_action("Rust")
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["title"], "Rust");
                    assert_eq!(course["description"], "Rust description");
                    assert_eq!(course["num_lessons"], 0);
                    assert_eq!(course["lessons"], json!([]));
                    assert_eq!(course["is_subscribed"], false);
                    assert!(course["owner_id"].is_string());
                })
                .with_save_as("course"),
        )
        .step(create_lesson_action("course", "Ownership"))
        .step(create_lesson_action("course", "Borrowing"))
        .step(
            Action::new("course_get", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["num_lessons"], 2);
                    let lessons = course["lessons"].as_array().expect("lessons array");
                    assert_eq!(lessons.len(), 2);
                    assert_eq!(lessons[0]["title"], "Ownership");
                    assert_eq!(lessons[1]["title"], "Borrowing");
                    assert_eq!(lessons[0]["course_id"], course["id"]);
                    assert!(lessons[0]["video_url"].is_string());
                    assert_eq!(course["is_subscribed"], false);
                }),
        )
        .step(
            Action::new("course_list", "GET", "/api/v1/courses/").assert_body(|body| {
                let page = parse(body);
                assert_eq!(page["total"], 1);
                let items = page["items"].as_array().expect("items array");
                assert_eq!(items.len(), 1);
                assert_eq!(items[0]["num_lessons"], 2);
                assert_eq!(items[0]["lessons"].as_array().map(Vec::len), Some(2));
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_lesson_count_follows_deletes_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher"))
        .step(create_course_action("Go").with_save_as("course"))
        .step(create_lesson_action("course", "Goroutines").with_save_as("lesson"))
        .step(create_lesson_action("course", "Channels"))
        .step(Action::new("lesson_delete", "DELETE", "").with_dyn_path(lesson_path("lesson")))
        .step(
            Action::new("course_get", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["num_lessons"], 1);
                    assert_eq!(course["lessons"][0]["title"], "Channels");
                }),
        )
        .step(Action::new("course_delete", "DELETE", "").with_dyn_path(course_path("course", "")))
        .step(
            Action::new("course_get_deleted", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_subscription_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher"))
        .step(create_course_action("Haskell").with_save_as("course"))
        .step(
            Action::new("subscribe", "POST", "")
                .with_dyn_path(course_path("course", "/subscription"))
                .assert_body(|body| {
                    let state = parse(body);
                    assert_eq!(state["is_subscribed"], true);
                }),
        )
        .step(
            Action::new("course_get_subscribed", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .assert_body(|body| assert_eq!(parse(body)["is_subscribed"], true)),
        )
        .step(
            Action::new("subscriptions_list", "GET", "/api/v1/subscriptions/").assert_body(|body| {
                let page = parse(body);
                assert_eq!(page["total"], 1);
            }),
        )
        // another user does not see someone else's subscription
        .step(signup_action("student", "student").with_clear_cookies(true))
        .step(
            Action::new("course_get_other_user", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .assert_body(|body| assert_eq!(parse(body)["is_subscribed"], false)),
        )
        .step(
            Action::new("subscriptions_list_other_user", "GET", "/api/v1/subscriptions/")
                .assert_body(|body| assert_eq!(parse(body)["total"], 0)),
        )
        // toggling twice restores the original state
        .step(signin_action("teacher", "teacher").with_clear_cookies(true))
        .step(
            Action::new("unsubscribe", "POST", "")
                .with_dyn_path(course_path("course", "/subscription"))
                .assert_body(|body| assert_eq!(parse(body)["is_subscribed"], false)),
        )
        .step(
            Action::new("course_get_unsubscribed", "GET", "")
                .with_dyn_path(course_path("course", ""))
                .assert_body(|body| assert_eq!(parse(body)["is_subscribed"], false)),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_requires_auth_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("course_list_anonymous", "GET", "/api/v1/courses/")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Authentication"))),
        )
        .step(
            Action::new("course_create_anonymous", "POST", "/api/v1/courses/")
                .with_body(json!({ "title": "Nope" }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("lesson_list_anonymous", "GET", "/api/v1/lessons/")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_access_test() {
    let pool = setup_test_db().await;
    seed_admin(&pool, "admin", "admin").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("owner", "owner"))
        .step(create_course_action("Elixir").with_save_as("course"))
        .step(create_lesson_action("course", "Processes").with_save_as("lesson"))
        .step(signup_action("intruder", "intruder").with_clear_cookies(true))
        .step(
            Action::new("course_update_foreign", "PUT", "")
                .with_dyn_path(course_path("course", ""))
                .with_body(json!({ "title": "Hijacked" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("course_delete_foreign", "DELETE", "")
                .with_dyn_path(course_path("course", ""))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(create_lesson_action("course", "Injected").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("lesson_delete_foreign", "DELETE", "")
                .with_dyn_path(lesson_path("lesson"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // the owner may edit
        .step(signin_action("owner", "owner").with_clear_cookies(true))
        .step(
            Action::new("course_update", "PUT", "")
                .with_dyn_path(course_path("course", ""))
                .with_body(json!({ "title": "Elixir in Action", "description": "OTP" }))
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["title"], "Elixir in Action");
                    assert_eq!(course["num_lessons"], 1);
                }),
        )
        // and so may an admin
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("course_delete_admin", "DELETE", "")
                .with_dyn_path(course_path("course", "")),
        )
        .step(
            Action::new("lesson_get_cascaded", "GET", "")
                .with_dyn_path(lesson_path("lesson"))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_lesson_validation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher"))
        .step(create_course_action("Zig").with_save_as("course"))
        .step(
            Action::new("lesson_unknown_course", "POST", "/api/v1/lessons/")
                .with_body(json!({
                    "course_id": uuid::Uuid::new_v4(),
                    "title": "Orphan",
                }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("lesson_empty_title", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| json!({ "course_id": ctx.get("course")["id"], "title": "  " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("course_empty_title", "POST", "/api/v1/courses/")
                .with_body(json!({ "title": "" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("course_unknown", "GET", "")
                .with_dyn_path(|_| format!("/api/v1/courses/{}", uuid::Uuid::new_v4()))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("subscribe_unknown", "POST", "")
                .with_dyn_path(|_| format!("/api/v1/courses/{}/subscription", uuid::Uuid::new_v4()))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

fn move_lesson_action(name: &'static str, target_key: &'static str) -> Action {
    Action::new(name, "PUT", "")
        .with_dyn_path(lesson_path("lesson"))
        .with_dyn_body(move |ctx| {
            json!({
                "course_id": ctx.get(target_key)["id"],
                "title": "Pattern matching",
            })
        })
}

#[tokio::test]
async fn route_lesson_move_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("owner", "owner"))
        .step(create_course_action("OCaml").with_save_as("from"))
        .step(create_course_action("Reason").with_save_as("to"))
        .step(create_lesson_action("from", "Variants").with_save_as("lesson"))
        .step(move_lesson_action("lesson_move_own", "to").assert_body(|body| {
            let lesson = parse(body);
            assert_eq!(lesson["title"], "Pattern matching");
        }))
        .step(
            Action::new("source_course", "GET", "")
                .with_dyn_path(course_path("from", ""))
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["num_lessons"], 0);
                    assert_eq!(course["lessons"], json!([]));
                }),
        )
        .step(
            Action::new("target_course", "GET", "")
                .with_dyn_path(course_path("to", ""))
                .assert_body(|body| {
                    let course = parse(body);
                    assert_eq!(course["num_lessons"], 1);
                    assert_eq!(course["lessons"][0]["title"], "Pattern matching");
                }),
        )
        .step(
            Action::new("lesson_move_unknown", "PUT", "")
                .with_dyn_path(lesson_path("lesson"))
                .with_body(json!({
                    "course_id": uuid::Uuid::new_v4(),
                    "title": "Lost",
                }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        // someone else's course
        .step(signup_action("stranger", "stranger").with_clear_cookies(true))
        .step(create_course_action("F#").with_save_as("foreign"))
        .step(move_lesson_action("lesson_update_not_owner", "foreign").with_expect(StatusCode::FORBIDDEN))
        .step(signin_action("owner", "owner").with_clear_cookies(true))
        .step(move_lesson_action("lesson_move_foreign", "foreign").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("foreign_course_untouched", "GET", "")
                .with_dyn_path(course_path("foreign", ""))
                .assert_body(|body| assert_eq!(parse(body)["num_lessons"], 0)),
        )
        .step(
            Action::new("target_course_kept", "GET", "")
                .with_dyn_path(course_path("to", ""))
                .assert_body(|body| assert_eq!(parse(body)["num_lessons"], 1)),
        )
        .run(&mut server, pool)
        .await;
}
