// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

// Limite do corpo para upload de documentos
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route(
            "/",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route("/me", get(handlers::auth::get_me));

    let case_routes = Router::new()
        .route(
            "/",
            post(handlers::cases::create_case).get(handlers::cases::list_cases),
        )
        .route(
            "/{id}",
            get(handlers::cases::get_case).patch(handlers::cases::update_case),
        )
        .route("/{id}/advance", post(handlers::cases::advance_case))
        .route("/{id}/assign", post(handlers::cases::assign_project_head))
        .route("/{id}/activities", get(handlers::cases::list_activities))
        // Planejamento e execução
        .route("/{id}/plan", put(handlers::execution::save_plan))
        .route("/{id}/plan/submit", post(handlers::execution::submit_plan))
        .route("/{id}/plan/approvals", post(handlers::execution::record_approval))
        .route("/{id}/daily-logs", post(handlers::execution::add_daily_log))
        .route("/{id}/materials", post(handlers::execution::add_material))
        .route(
            "/{id}/execution/complete",
            post(handlers::execution::mark_execution_complete),
        )
        .route("/{id}/jms/launch", post(handlers::execution::launch_jms))
        .route("/{id}/jms/sign", post(handlers::execution::sign_jms))
        .route("/{id}/workspace", get(handlers::execution::get_workspace))
        // Tarefas, documentos e pagamentos do caso
        .route(
            "/{id}/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::list_case_tasks),
        )
        .route(
            "/{id}/documents",
            post(handlers::documents::upload_document)
                .get(handlers::documents::list_documents)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/{id}/payments",
            post(handlers::accounts::record_payment).get(handlers::accounts::list_payments),
        );

    let task_routes = Router::new()
        .route("/mine", get(handlers::tasks::list_my_tasks))
        .route("/{id}/status", patch(handlers::tasks::update_task_status));

    let document_routes =
        Router::new().route("/{id}/content", get(handlers::documents::download_document));

    let account_routes = Router::new()
        .route(
            "/ledger",
            post(handlers::accounts::create_ledger_entry)
                .get(handlers::accounts::list_ledger_entries),
        )
        .route(
            "/salary",
            post(handlers::accounts::create_salary_entry)
                .get(handlers::accounts::list_salary_entries),
        )
        .route("/salary/summary", get(handlers::accounts::salary_summary))
        .route("/overview", get(handlers::accounts::accounts_overview));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route(
            "/{id}/read",
            post(handlers::notifications::mark_notification_read),
        );

    let dashboard_routes =
        Router::new().route("/pipeline", get(handlers::dashboard::get_pipeline));

    // Tudo abaixo exige token
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/cases", case_routes)
        .nest("/tasks", task_routes)
        .nest("/documents", document_routes)
        .nest("/accounts", account_routes)
        .nest("/notifications", notification_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Repositories};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    const ADMIN_EMAIL: &str = "admin@obra.test";
    const ADMIN_PASSWORD: &str = "segredo123";

    async fn test_app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".into()),
            "JWT_SECRET" => Some("segredo-de-teste".into()),
            "BCRYPT_COST" => Some("4".into()),
            "PUBLIC_BASE_URL" => Some("http://obra.test".into()),
            _ => None,
        })
        .unwrap();
        let organization_id = config.organization_id;
        let state = AppState::from_repositories(config, Repositories::in_memory());
        state
            .auth_service
            .ensure_bootstrap_admin(organization_id, ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();
        build_router(state)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Cria um usuário com o admin e devolve (id, token).
    async fn user_with_role(app: &Router, admin: &str, email: &str, role: &str) -> (String, String) {
        let (status, body) = call(
            app,
            "POST",
            "/api/users",
            Some(admin),
            Some(json!({
                "email": email,
                "password": "senha123",
                "fullName": email,
                "role": role,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["id"].as_str().unwrap().to_string();
        (id, login(app, email, "senha123").await)
    }

    #[tokio::test]
    async fn health_is_public_and_the_rest_needs_a_token() {
        let app = test_app().await;

        let (status, _) = call(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", "/api/cases", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, "GET", "/api/cases", Some("lixo"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_payload_reports_field_details() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/cases",
            Some(&admin),
            Some(json!({ "clientName": "", "siteAddress": "Rua A" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["client_name"].is_array(), "{body}");
    }

    #[tokio::test]
    async fn roles_without_the_capability_get_403() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, accounts) = user_with_role(&app, &admin, "contas@obra.test", "ACCOUNTS").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/cases",
            Some(&accounts),
            Some(json!({ "clientName": "Cliente", "siteAddress": "Rua A" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

        let (status, _) = call(&app, "GET", "/api/users", Some(&accounts), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "GET", "/api/accounts/overview", Some(&accounts), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn full_case_lifecycle_over_http() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (head_id, head) =
            user_with_role(&app, &admin, "head@obra.test", "PROJECT_HEAD").await;
        let (_, sales) = user_with_role(&app, &admin, "vendas@obra.test", "SALES_MANAGER").await;

        // Lead -> aguardando planejamento
        let (status, case) = call(
            &app,
            "POST",
            "/api/cases",
            Some(&sales),
            Some(json!({ "clientName": "Mariana Costa", "siteAddress": "Rua Augusta, 1500" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{case}");
        assert_eq!(case["status"], "LEAD");
        let id = case["id"].as_str().unwrap().to_string();

        for (to, token) in [
            ("SITE_VISIT", &sales),
            ("DRAWING", &sales),
            ("QUOTATION", &admin),
        ] {
            let (status, body) = call(
                &app,
                "POST",
                &format!("/api/cases/{id}/advance"),
                Some(token),
                Some(json!({ "to": to })),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(body["status"], to);
        }
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/advance"),
            Some(&sales),
            Some(json!({ "to": "WAITING_FOR_PLANNING", "quotedAmount": 150000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["costCenter"]["totalBudget"], 150000.0);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/assign"),
            Some(&admin),
            Some(json!({ "projectHeadId": head_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Planejamento
        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/cases/{id}/plan"),
            Some(&head),
            Some(json!({
                "phases": [{ "name": "Marcenaria", "startDate": "2026-11-02", "endDate": "2026-11-20" }],
                "days": [{ "date": "2026-11-02", "work": "Demolição" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (status, body) =
            call(&app, "POST", &format!("/api/cases/{id}/plan/submit"), Some(&head), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "PLANNING_SUBMITTED");

        // Project Head não aprova como admin
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/plan/approvals"),
            Some(&head),
            Some(json!({ "party": "ADMIN" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/plan/approvals"),
            Some(&admin),
            Some(json!({ "party": "ADMIN" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["transitioned"], false);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/plan/approvals"),
            Some(&head),
            Some(json!({ "party": "CLIENT" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["transitioned"], true);
        assert_eq!(body["case"]["status"], "EXECUTION_ACTIVE");

        // Execução e encerramento
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/daily-logs"),
            Some(&head),
            Some(json!({ "logDate": "2026-11-03", "summary": "Demolição concluída", "progressPercent": 15 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        for step in ["execution/complete", "jms/launch"] {
            let (status, body) =
                call(&app, "POST", &format!("/api/cases/{id}/{step}"), Some(&head), None).await;
            assert_eq!(status, StatusCode::OK, "{step}: {body}");
        }
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/jms/sign"),
            Some(&head),
            Some(json!({ "signedBy": "Mariana Costa" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "COMPLETED");

        // Caso concluído: workspace só leitura e escritas recusadas com 409
        let (status, view) =
            call(&app, "GET", &format!("/api/cases/{id}/workspace"), Some(&head), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["readOnly"], true);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/daily-logs"),
            Some(&head),
            Some(json!({ "logDate": "2026-11-04", "summary": "Extra", "progressPercent": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/tasks"),
            Some(&head),
            Some(json!({ "title": "Retoque" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Linha do tempo e notificações
        let (_, activities) =
            call(&app, "GET", &format!("/api/cases/{id}/activities"), Some(&admin), None).await;
        assert!(activities.as_array().unwrap().len() >= 8);

        let (_, inbox) = call(&app, "GET", "/api/notifications", Some(&head), None).await;
        assert!(!inbox.as_array().unwrap().is_empty());

        let (_, pipeline) = call(&app, "GET", "/api/dashboard/pipeline", Some(&sales), None).await;
        assert_eq!(pipeline["total"], 1);
    }

    #[tokio::test]
    async fn documents_upload_and_download_round_trip() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, case) = call(
            &app,
            "POST",
            "/api/cases",
            Some(&admin),
            Some(json!({ "clientName": "Cliente", "siteAddress": "Rua B" })),
        )
        .await;
        let id = case["id"].as_str().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/cases/{id}/documents?fileName=planta.pdf&category=DRAWING"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .header(header::CONTENT_TYPE, "application/pdf")
            .body(Body::from("%PDF-1.7 conteudo"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["category"], "DRAWING");
        let doc_id = doc["id"].as_str().unwrap();

        let request = Request::builder()
            .uri(format!("/api/documents/{doc_id}/content"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"%PDF-1.7 conteudo");
    }

    async fn get_with_org_header(app: &Router, token: &str, uri: &str, org: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("x-organization-id", org)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn organization_header_is_checked_on_every_protected_route() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let foreign = Uuid::new_v4().to_string();

        for uri in ["/api/cases", "/api/dashboard/pipeline", "/api/notifications", "/api/users/me"] {
            assert_eq!(
                get_with_org_header(&app, &admin, uri, &foreign).await,
                StatusCode::FORBIDDEN,
                "{uri}"
            );
            assert_eq!(
                get_with_org_header(&app, &admin, uri, "not-a-uuid").await,
                StatusCode::BAD_REQUEST,
                "{uri}"
            );
        }

        // Organização do admin semeado (ORGANIZATION_ID ausente = UUID nulo)
        let own = Uuid::nil().to_string();
        assert_eq!(get_with_org_header(&app, &admin, "/api/cases", &own).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn blank_text_fields_are_rejected_over_http() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (status, case) = call(
            &app,
            "POST",
            "/api/cases",
            Some(&admin),
            Some(json!({ "clientName": "Cliente", "siteAddress": "Rua C" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = case["id"].as_str().unwrap();

        let (status, _) = call(
            &app,
            "PATCH",
            &format!("/api/cases/{id}"),
            Some(&admin),
            Some(json!({ "clientName": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/cases/{id}/jms/sign"),
            Some(&admin),
            Some(json!({ "signedBy": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn foreign_organization_header_is_rejected() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let request = Request::builder()
            .uri("/api/dashboard/pipeline")
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .header("x-organization-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
