#[cfg(test)]
mod tests {
    use std::env;
    use std::time::Duration;

    use serial_test::serial;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::dashboard::TogglePolicy;
    use crate::editor::{FlagCreateEditor, FlagEditEditor, ProjectCreateEditor};
    use crate::explorer::{self, Explorer, ExplorerCall};
    use crate::flag::{Environment, NewFlag};
    use crate::notify::{ToastQueue, Tone};
    use crate::project::{NewProject, ProjectFlags};
    use crate::remote::{RemoteCollection, Toggle};
    use crate::session::{Credentials, LoginForm, SignupForm};
    use crate::{AppContext, Client, ClientBuilder, Dashboard, DeckError};

    // Helper function to create a test client against the mock server
    fn create_test_client(server: &MockServer) -> Client {
        Client::builder()
            .with_base_url(&server.uri())
            .build()
            .expect("Failed to build test client")
    }

    fn envelope(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "success": true,
            "data": data,
            "message": "ok"
        }))
    }

    fn failure(status: u16, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "statusCode": status,
            "success": false,
            "data": null,
            "message": message
        }))
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/userInfo"))
            .respond_with(envelope(serde_json::json!({
                "_id": "u1",
                "username": "ada",
                "email": "ada@example.com",
                "api_key": "key-123"
            })))
            .mount(server)
            .await;
    }

    async fn signed_in_context(server: &MockServer) -> AppContext {
        mount_session(server).await;
        let mut ctx = AppContext::new(create_test_client(server));
        assert!(ctx.init().await.is_some());
        ctx
    }

    #[tokio::test]
    async fn test_client_initialization() {
        let client = Client::builder()
            .with_base_url("https://test-api.example.com/api/")
            .with_access_token("secret")
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://test-api.example.com/api");
        assert_eq!(client.access_token().as_deref(), Some("secret"));
        assert!(client.debug_info().contains("has_token: true"));

        let default = Client::builder().build().unwrap();
        assert_eq!(default.base_url(), "http://localhost:8080/api");
        assert!(default.access_token().is_none());
    }

    #[tokio::test]
    async fn test_empty_base_url_is_rejected() {
        let result = Client::builder().with_base_url("").build();
        assert!(matches!(result, Err(DeckError::Config(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_builder_from_environment() {
        env::set_var("FLAGDECK_API_URL", "https://flags.example.com/api");
        env::set_var("FLAGDECK_ACCESS_TOKEN", "env-token");

        let client = ClientBuilder::from_env().build().unwrap();
        assert_eq!(client.base_url(), "https://flags.example.com/api");
        assert_eq!(client.access_token().as_deref(), Some("env-token"));

        env::remove_var("FLAGDECK_API_URL");
        env::remove_var("FLAGDECK_ACCESS_TOKEN");

        let client = ClientBuilder::from_env().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert!(client.access_token().is_none());
    }

    #[tokio::test]
    async fn test_list_projects() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .respond_with(envelope(serde_json::json!([
                {
                    "_id": "p1",
                    "name": "Checkout",
                    "description": "Checkout revamp",
                    "projectId": "share-1",
                    "flags": [
                        { "_id": "f1", "name": "new-button", "environment": "production", "isEnabled": "true" }
                    ],
                    "createdAt": "2024-01-01T00:00:00.000Z",
                    "updatedAt": "2024-01-02T00:00:00.000Z"
                },
                { "_id": "p2", "name": "Search" }
            ])))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let projects = client.projects().list().await.unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].project_id.as_deref(), Some("share-1"));
        assert_eq!(projects[0].flag_count(), 1);
        let flag = &projects[0].embedded_flags()[0];
        assert!(flag.enabled());
        assert_eq!(flag.environment, Some(Environment::Production));
        assert_eq!(projects[1].description, None);
    }

    #[tokio::test]
    async fn test_list_projects_with_flag_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .respond_with(envelope(serde_json::json!([
                { "_id": "p1", "name": "Checkout", "flags": ["f1", "f2"] },
                { "_id": "p2", "name": "Search", "flags": [] }
            ])))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let projects = client.projects().list().await.unwrap();

        assert_eq!(
            projects[0].flags,
            Some(ProjectFlags::Referenced(vec!["f1".to_string(), "f2".to_string()]))
        );
        assert_eq!(projects[0].flag_count(), 2);
        assert!(projects[0].embedded_flags().is_empty());
        assert_eq!(projects[1].flag_count(), 0);

        let mut dashboard = Dashboard::new();
        let mut notices = ToastQueue::new();
        dashboard
            .load_projects(&client.projects(), &mut notices)
            .await
            .unwrap();
        assert_eq!(dashboard.projects().len(), 2);
        assert_eq!(dashboard.flag_count("p1"), 2);
    }

    #[tokio::test]
    async fn test_list_with_null_data_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .respond_with(envelope(serde_json::Value::Null))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.projects().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_project_scenario() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/createProject"))
            .and(body_json(serde_json::json!({
                "name": "Checkout",
                "description": "Checkout revamp"
            })))
            .respond_with(envelope(serde_json::json!({
                "_id": "p1",
                "name": "Checkout",
                "description": "Checkout revamp",
                "flags": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = signed_in_context(&mock_server).await;

        let mut editor = ProjectCreateEditor::new();
        editor.name = "Checkout".to_string();
        editor.description = "Checkout revamp".to_string();
        ctx.create_project(&mut editor).await.unwrap();

        let projects = ctx.dashboard().projects().entries();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "p1");
        assert_eq!(
            ctx.notices().last().map(|n| n.message.as_str()),
            Some("Project Created Successfully")
        );
    }

    #[tokio::test]
    async fn test_remote_messages_surface_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/createProject"))
            .respond_with(failure(409, "Project with this name already exists"))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/projects/deleteProject/p1"))
            .respond_with(failure(500, "Database unavailable"))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/projects/updateProject"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let projects = client.projects();

        let err = projects
            .create(&NewProject {
                name: "Checkout".to_string(),
                description: "Dup".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Rejected { status: 409, .. }));
        assert_eq!(err.to_string(), "Project with this name already exists");

        let err = projects.delete("p1").await.unwrap_err();
        assert!(matches!(err, DeckError::Server { status: 500, .. }));
        assert_eq!(err.to_string(), "Database unavailable");

        let patch = crate::project::ProjectPatch {
            name: "x".to_string(),
            description: String::new(),
        };
        let err = projects.update("p1", &patch).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_with_ok_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/createProject"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 400,
                "success": false,
                "data": null,
                "message": "Name is required"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .projects()
            .create(&NewProject {
                name: "x".to_string(),
                description: "y".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DeckError::Rejected { status: 400, .. }));
        assert_eq!(err.to_string(), "Name is required");
    }

    #[tokio::test]
    async fn test_create_without_data_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/flags/createFlag/p1"))
            .respond_with(envelope(serde_json::Value::Null))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .flags("p1")
            .create(&NewFlag {
                name: "beta".to_string(),
                description: "Beta".to_string(),
                environment: Environment::Development,
                is_enabled: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_flag_create_and_update_wire_format() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getProjectDetails/p1"))
            .respond_with(envelope(serde_json::json!({
                "_id": "p1",
                "name": "Checkout",
                "flags": [
                    { "_id": "f0", "name": "legacy", "environment": "staging", "isEnabled": false }
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/flags/createFlag/p1"))
            .and(body_json(serde_json::json!({
                "name": "new-button",
                "description": "Shiny",
                "environment": "production",
                "isEnabled": "true"
            })))
            .respond_with(envelope(serde_json::json!({
                "_id": "f1",
                "name": "new-button",
                "description": "Shiny",
                "environment": "production",
                "isEnabled": "true"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/flags/updateFlag"))
            .and(body_json(serde_json::json!({
                "flagId": "f1",
                "name": "new-button",
                "description": "Shinier",
                "environment": "production",
                "isEnabled": "false"
            })))
            .respond_with(envelope(serde_json::json!({
                "_id": "f1",
                "description": "Shinier",
                "isEnabled": false
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = signed_in_context(&mock_server).await;
        let flags = ctx.open_project("p1").await.unwrap();
        assert_eq!(flags.len(), 1);

        let mut create = FlagCreateEditor::new();
        create.name = "new-button".to_string();
        create.description = "Shiny".to_string();
        create.environment = Environment::Production;
        let created = ctx.create_flag("p1", &mut create).await.unwrap();
        assert!(created.enabled());

        let mut edit = FlagEditEditor::new(&created);
        edit.description = "Shinier".to_string();
        edit.enabled = false;
        ctx.save_flag("p1", &mut edit).await.unwrap();

        let cache = ctx.dashboard().flags("p1").unwrap();
        let ids: Vec<&str> = cache.entries().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f0"]);
        let updated = cache.get("f1").unwrap();
        assert_eq!(updated.name, "new-button");
        assert_eq!(updated.description.as_deref(), Some("Shinier"));
        assert!(!updated.enabled());
    }

    #[tokio::test]
    async fn test_toggle_failure_keeps_optimistic_flip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getProjectDetails/p1"))
            .respond_with(envelope(serde_json::json!({
                "_id": "p1",
                "name": "Checkout",
                "flags": [ { "_id": "f1", "name": "beta", "isEnabled": "false" } ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/flags/toggleFlagState"))
            .and(body_json(serde_json::json!({ "flagId": "f1" })))
            .respond_with(failure(500, "Toggle failed"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = signed_in_context(&mock_server).await;
        ctx.open_project("p1").await.unwrap();

        let err = ctx.toggle_flag("p1", "f1").await.unwrap_err();
        assert_eq!(err.to_string(), "Toggle failed");
        assert!(ctx.dashboard().flags("p1").unwrap().get("f1").unwrap().enabled());
        assert_eq!(ctx.notices().last().map(|n| n.tone), Some(Tone::Error));
    }

    #[tokio::test]
    async fn test_toggle_success_ignores_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/flags/toggleFlagState"))
            .respond_with(envelope(serde_json::json!({ "_id": "f1", "isEnabled": "false" })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let mut dashboard = Dashboard::new().with_toggle_policy(TogglePolicy::KeepOptimistic);
        let flag: crate::Flag =
            serde_json::from_value(serde_json::json!({ "_id": "f1", "name": "beta", "isEnabled": false }))
                .unwrap();
        dashboard.flags_mut("p1").refresh(vec![flag]);

        let mut notices = ToastQueue::new();
        let now = dashboard
            .toggle_flag("p1", "f1", &client.flags("p1"), &mut notices)
            .await
            .unwrap();

        assert!(now);
        assert!(dashboard.flags("p1").unwrap().get("f1").unwrap().enabled());
        client.flags("p1").toggle("f1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_project_and_flag() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .respond_with(envelope(serde_json::json!([
                { "_id": "p1", "name": "Checkout", "flags": [ { "_id": "f1", "name": "a" } ] },
                { "_id": "p2", "name": "Search" }
            ])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/projects/getProjectDetails/p1"))
            .respond_with(envelope(serde_json::json!({
                "_id": "p1",
                "flags": [ { "_id": "f1", "name": "a" }, { "_id": "f2", "name": "b" } ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/flags/deleteFlag/f2"))
            .respond_with(envelope(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/projects/deleteProject/p1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = signed_in_context(&mock_server).await;
        assert_eq!(ctx.load_projects().await.unwrap().len(), 2);
        assert_eq!(ctx.dashboard().flag_count("p1"), 1);

        ctx.open_project("p1").await.unwrap();
        assert_eq!(ctx.dashboard().flag_count("p1"), 2);

        ctx.delete_flag("p1", "f2").await.unwrap();
        assert_eq!(ctx.dashboard().flag_count("p1"), 1);

        ctx.delete_project("p1").await.unwrap();
        let ids: Vec<&str> = ctx
            .dashboard()
            .projects()
            .entries()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p2"]);
        assert!(ctx.dashboard().flags("p1").is_none());
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/userInfo"))
            .respond_with(failure(401, "Unauthorized request"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .respond_with(envelope(serde_json::json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut ctx = AppContext::new(create_test_client(&mock_server));
        assert!(ctx.init().await.is_none());
        assert!(!ctx.is_signed_in());

        let err = ctx.load_projects().await.unwrap_err();
        assert!(matches!(err, DeckError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_login_keeps_token_and_logout_tears_down() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .and(body_json(serde_json::json!({
                "email": "ada@example.com",
                "password": "hunter2"
            })))
            .respond_with(envelope(serde_json::json!({
                "user": {
                    "_id": "u1",
                    "username": "ada",
                    "fullName": "ada lovelace",
                    "email": "ada@example.com",
                    "api_key": "key-123"
                },
                "accessToken": "tok-1"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/projects/getAllProjectsByUser"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(envelope(serde_json::json!([
                { "_id": "p1", "name": "Checkout", "projectId": "share-1" }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/users/logout"))
            .respond_with(envelope(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = AppContext::new(create_test_client(&mock_server));
        let mut form = LoginForm::new();
        form.email = "ada@example.com".to_string();
        form.password = "hunter2".to_string();

        let user = ctx.login(&mut form).await.unwrap();
        assert_eq!(user.display_name(), "Ada lovelace");
        assert!(form.password.is_empty());
        assert_eq!(ctx.client().access_token().as_deref(), Some("tok-1"));

        ctx.load_projects().await.unwrap();
        let project = ctx.dashboard().projects().get("p1").unwrap().clone();
        assert_eq!(
            ctx.share_url(&project).as_deref(),
            Some(format!("{}/projects/getProject/key-123/share-1", mock_server.uri()).as_str())
        );

        ctx.logout().await.unwrap();
        assert!(!ctx.is_signed_in());
        assert!(ctx.dashboard().projects().is_empty());
        assert!(ctx.client().access_token().is_none());
        assert_eq!(
            ctx.notices().last().map(|n| n.message.as_str()),
            Some("Logout successful")
        );
    }

    #[tokio::test]
    async fn test_failed_login_keeps_form() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(failure(401, "Invalid user credentials"))
            .mount(&mock_server)
            .await;

        let mut ctx = AppContext::new(create_test_client(&mock_server));
        let mut form = LoginForm::new();
        form.email = "ada@example.com".to_string();
        form.password = "wrong".to_string();

        let err = ctx.login(&mut form).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid user credentials");
        assert_eq!(form.state().error(), Some("Invalid user credentials"));
        assert_eq!(form.password, "wrong");
        assert!(!ctx.is_signed_in());
    }

    #[tokio::test]
    async fn test_signup_checks_passwords_before_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/signup"))
            .and(body_partial_json(serde_json::json!({ "username": "ada" })))
            .respond_with(envelope(serde_json::json!({
                "_id": "u1",
                "username": "ada",
                "email": "ada@example.com"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut ctx = AppContext::new(create_test_client(&mock_server));
        let mut form = SignupForm::new();
        form.username = "ada".to_string();
        form.email = "ada@example.com".to_string();
        form.password = "hunter2".to_string();
        form.confirm_password = "hunter3".to_string();

        let err = ctx.signup(&mut form).await.unwrap_err();
        assert!(matches!(err, DeckError::Precondition(_)));
        assert_eq!(form.state().error(), Some("Passwords do not match"));

        form.confirm_password = "hunter2".to_string();
        let user = ctx.signup(&mut form).await.unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert!(form.password.is_empty());
    }

    #[tokio::test]
    async fn test_login_without_token_uses_cookies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(envelope(serde_json::json!({
                "_id": "u1",
                "username": "grace",
                "email": "grace@example.com"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let user = client
            .login(&Credentials {
                email: "grace@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Grace");
        assert!(client.access_token().is_none());
    }

    #[tokio::test]
    async fn test_public_project_and_explorer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/getProjectDetails/key-123/share-1"))
            .respond_with(envelope(serde_json::json!({
                "_id": "p1",
                "name": "Checkout",
                "projectId": "share-1",
                "flags": [ { "_id": "f1", "name": "beta", "isEnabled": true } ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/flags/deleteFlag/f9"))
            .respond_with(failure(404, "Flag not found"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let project = client.public_project("key-123", "share-1").await.unwrap();
        assert_eq!(project.flag_count(), 1);

        let explorer = Explorer::new(&client);
        let mut notices = ToastQueue::new();

        let details = ExplorerCall::ProjectDetails {
            api_key: "key-123".to_string(),
            project_id: "share-1".to_string(),
        };
        let body = explorer.call(&details, &mut notices).await;
        assert_eq!(body["data"]["name"], "Checkout");
        assert_eq!(notices.last().map(|n| n.message.as_str()), Some("Done"));

        let delete = ExplorerCall::DeleteFlag {
            flag_id: "f9".to_string(),
        };
        let body = explorer.call(&delete, &mut notices).await;
        assert_eq!(body["error"]["message"], "Flag not found");
        assert_eq!(notices.last().map(|n| n.message.as_str()), Some("Flag not found"));

        assert_eq!(
            details.curl("http://localhost:8080/api/"),
            "curl -s \"http://localhost:8080/api/projects/getProjectDetails/key-123/share-1\" | jq"
        );
        assert_eq!(
            explorer::public_details_url("http://localhost:8080/api", "k", "s"),
            "http://localhost:8080/api/projects/getProjectDetails/k/s"
        );
    }

    #[test]
    fn test_explorer_update_body_skips_blank_fields() {
        let call = ExplorerCall::UpdateFlag {
            flag_id: "f1".to_string(),
            name: Some("  ".to_string()),
            description: Some("New copy".to_string()),
            environment: None,
            enabled: false,
        };

        assert_eq!(
            call.body(),
            Some(serde_json::json!({
                "flagId": "f1",
                "description": "New copy",
                "isEnabled": "false"
            }))
        );
        assert!(call.curl("http://localhost:8080/api").starts_with("curl -X PUT"));
    }
}
