use axum::http::StatusCode;
use axum_test::TestServer;
use focus_tracker::api::{create_router, CALLER_HEADER};
use focus_tracker::db::Database;
use focus_tracker::models::*;
use focus_tracker::stats::PomodoroStats;
use serde_json::json;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_project(server: &TestServer, owner: Uuid) -> Project {
    server
        .post("/api/v1/projects")
        .add_header(CALLER_HEADER, owner.to_string())
        .json(&CreateProjectInput {
            title: "Test Project".to_string(),
            description: None,
            color: None,
        })
        .await
        .json::<Project>()
}

async fn create_test_goal(server: &TestServer, owner: Uuid, project_id: Uuid, title: &str) -> Goal {
    server
        .post(&format!("/api/v1/projects/{}/goals", project_id))
        .add_header(CALLER_HEADER, owner.to_string())
        .json(&CreateGoalInput {
            title: title.to_string(),
            description: None,
        })
        .await
        .json::<Goal>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn needs_no_caller() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod caller_identity {
    use super::*;

    #[tokio::test]
    async fn missing_caller_is_unauthorized() {
        let server = setup();

        let response = server.get("/api/v1/projects").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_caller_is_unauthorized() {
        let server = setup();

        let response = server
            .get("/api/v1/projects")
            .add_header(CALLER_HEADER, "not-a-uuid")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_users_get_not_found() {
        let server = setup();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;

        server
            .get(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, stranger.to_string())
            .await
            .assert_status_not_found();

        server
            .delete(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, stranger.to_string())
            .await
            .assert_status_not_found();

        server
            .get(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status_ok();
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn create_returns_created() {
        let server = setup();
        let owner = Uuid::new_v4();

        let response = server
            .post("/api/v1/projects")
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "title": "Thesis", "color": "#3B82F6" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let project: Project = response.json();
        assert_eq!(project.title, "Thesis");
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.owner_id, owner);
    }

    #[tokio::test]
    async fn create_trims_title_and_description() {
        let server = setup();
        let owner = Uuid::new_v4();

        let response = server
            .post("/api/v1/projects")
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "title": "  Thesis  ", "description": "\tchapter drafts " }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let project: Project = response.json();
        assert_eq!(project.title, "Thesis");
        assert_eq!(project.description.as_deref(), Some("chapter drafts"));

        let updated: Project = server
            .put(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "title": " Dissertation " }))
            .await
            .json();
        assert_eq!(updated.title, "Dissertation");
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .json(&json!({ "title": "   " }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_rejects_bad_color() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .json(&json!({ "title": "Thesis", "color": "blue" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn list_paginates() {
        let server = setup();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            create_test_project(&server, owner).await;
        }

        let response = server
            .get("/api/v1/projects")
            .add_header(CALLER_HEADER, owner.to_string())
            .add_query_param("page", 2)
            .add_query_param("limit", 2)
            .await;

        response.assert_status_ok();
        let page: ProjectPage = response.json();
        assert_eq!(page.projects.len(), 1);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn completing_sets_completed_at() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;

        let response = server
            .put(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "status": "COMPLETED" }))
            .await;

        response.assert_status_ok();
        let updated: Project = response.json();
        assert_eq!(updated.status, ProjectStatus::Completed);
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn get_includes_goals() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        create_test_goal(&server, owner, project.id, "Outline").await;

        let response = server
            .get(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await;

        response.assert_status_ok();
        let found: ProjectWithGoals = response.json();
        assert_eq!(found.goals_total, 1);
        assert_eq!(found.goals[0].title, "Outline");
    }

    #[tokio::test]
    async fn delete_returns_no_content() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;

        server
            .delete(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/projects/{}", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let server = setup();

        let response = server
            .get("/api/v1/projects/not-a-uuid")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .await;

        response.assert_status_bad_request();
    }
}

mod goals {
    use super::*;

    #[tokio::test]
    async fn create_appends_to_the_order() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;

        let first = create_test_goal(&server, owner, project.id, "A").await;
        let second = create_test_goal(&server, owner, project.id, "B").await;

        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
    }

    #[tokio::test]
    async fn create_and_update_trim_text() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;

        let goal = create_test_goal(&server, owner, project.id, "  Outline \n").await;
        assert_eq!(goal.title, "Outline");

        let updated: Goal = server
            .put(&format!("/api/v1/goals/{}", goal.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "description": "  three parts  " }))
            .await
            .json();
        assert_eq!(updated.description.as_deref(), Some("three parts"));
    }

    #[tokio::test]
    async fn reorder_returns_no_content_and_applies() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let a = create_test_goal(&server, owner, project.id, "A").await;
        let b = create_test_goal(&server, owner, project.id, "B").await;

        server
            .put(&format!("/api/v1/projects/{}/goals/reorder", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "items": [
                { "id": a.id, "order": 1 },
                { "id": b.id, "order": 0 },
            ] }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let goals: Vec<Goal> = server
            .get(&format!("/api/v1/projects/{}/goals", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .json();
        let ids: Vec<Uuid> = goals.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn reorder_rejects_negative_positions() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let a = create_test_goal(&server, owner, project.id, "A").await;

        let response = server
            .put(&format!("/api/v1/projects/{}/goals/reorder", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "items": [{ "id": a.id, "order": -1 }] }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn failed_reorder_is_opaque_and_changes_nothing() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let a = create_test_goal(&server, owner, project.id, "A").await;

        let response = server
            .put(&format!("/api/v1/projects/{}/goals/reorder", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "items": [
                { "id": a.id, "order": 5 },
                { "id": Uuid::new_v4(), "order": 6 },
            ] }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_text("Internal server error");

        let goals: Vec<Goal> = server
            .get(&format!("/api/v1/projects/{}/goals", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .json();
        assert_eq!(goals[0].order, 0);
    }

    #[tokio::test]
    async fn clear_completed_reports_count() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let a = create_test_goal(&server, owner, project.id, "A").await;
        create_test_goal(&server, owner, project.id, "B").await;

        server
            .put(&format!("/api/v1/goals/{}", a.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "is_completed": true }))
            .await
            .assert_status_ok();

        let response = server
            .delete(&format!("/api/v1/projects/{}/goals/completed", project.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "count": 1 }));
    }

    #[tokio::test]
    async fn update_by_stranger_is_not_found() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let goal = create_test_goal(&server, owner, project.id, "A").await;

        server
            .put(&format!("/api/v1/goals/{}", goal.id))
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .json(&json!({ "is_completed": true }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_returns_no_content() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let goal = create_test_goal(&server, owner, project.id, "A").await;

        server
            .delete(&format!("/api/v1/goals/{}", goal.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}

mod pomodoro {
    use super::*;

    #[tokio::test]
    async fn start_then_complete() {
        let server = setup();
        let owner = Uuid::new_v4();

        let response = server
            .post("/api/v1/pomodoro/start")
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let session: PomodoroSession = response.json();
        assert_eq!(session.duration, DEFAULT_SESSION_MINUTES);

        let response = server
            .post(&format!("/api/v1/pomodoro/{}/complete", session.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await;
        response.assert_status_ok();
        let done: PomodoroSession = response.json();
        assert!(done.completed);
        assert!(done.end_time.is_some());

        server
            .post(&format!("/api/v1/pomodoro/{}/complete", session.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn start_rejects_out_of_range_duration() {
        let server = setup();

        let response = server
            .post("/api/v1/pomodoro/start")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .json(&json!({ "duration": 0 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn get_by_stranger_is_not_found() {
        let server = setup();
        let owner = Uuid::new_v4();
        let session: PomodoroSession = server
            .post("/api/v1/pomodoro/start")
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "duration": 50 }))
            .await
            .json();

        server
            .get(&format!("/api/v1/pomodoro/{}", session.id))
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn stats_fall_back_to_today() {
        let server = setup();
        let owner = Uuid::new_v4();
        let project = create_test_project(&server, owner).await;
        let session: PomodoroSession = server
            .post("/api/v1/pomodoro/start")
            .add_header(CALLER_HEADER, owner.to_string())
            .json(&json!({ "project_id": project.id, "duration": 25 }))
            .await
            .json();
        server
            .post(&format!("/api/v1/pomodoro/{}/complete", session.id))
            .add_header(CALLER_HEADER, owner.to_string())
            .await
            .assert_status_ok();

        let response = server
            .get("/api/v1/pomodoro/stats")
            .add_header(CALLER_HEADER, owner.to_string())
            .add_query_param("period", "fortnight")
            .add_query_param("tz_offset_minutes", 0)
            .await;

        response.assert_status_ok();
        let stats: PomodoroStats = response.json();
        assert_eq!(stats.period.as_str(), "today");
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_minutes, 25);
        assert_eq!(stats.by_project[0].project_id, project.id.to_string());
    }

    #[tokio::test]
    async fn stats_reject_impossible_offsets() {
        let server = setup();

        let response = server
            .get("/api/v1/pomodoro/stats")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .add_query_param("tz_offset_minutes", 5000)
            .await;

        response.assert_status_bad_request();
    }
}

mod security_auth {
    use super::*;
    use focus_tracker::api::{create_router_with_config, SecurityConfig};

    fn setup_with_auth(api_key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let config = SecurityConfig::with_api_key(api_key);
        let app = create_router_with_config(db, config);
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_requires_gateway_key() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/projects")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_wrong_key() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/projects")
            .add_header("Authorization", "Bearer wrong-key")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_accepts_valid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/projects")
            .add_header("Authorization", "Bearer test-secret-key")
            .add_header(CALLER_HEADER, Uuid::new_v4().to_string())
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn valid_key_still_needs_a_caller() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/projects")
            .add_header("Authorization", "Bearer test-secret-key")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
