/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use slipway_core::cache::ProgressCache;
    use slipway_core::runtime::DockerRuntime;
    use slipway_core::types::*;
    use entity::project::ProjectStatus;
    use entity::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_mock_cli() -> Cli {
        Cli {
            log_level: "info".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 8000,
            serve_url: "http://127.0.0.1:3000".to_string(),
            database_url: Some("mock://test".to_string()),
            database_url_file: None,
            jwt_secret_file: "test_jwt".to_string(),
            docker_socket: None,
            projects_path: "/app/projects".to_string(),
            host_projects_path: "./projects".to_string(),
            domain_suffix: ".localhost".to_string(),
            docker_network: "slipway-net".to_string(),
            proxy_containers: vec!["slipway-proxy".to_string(), "nginx-proxy".to_string()],
            proxy_config_path: "/etc/nginx/conf.d".to_string(),
            build_image: "node:20-alpine".to_string(),
            stream_poll_interval: 1,
            stream_max_polls: 120,
            disable_registration: false,
            report_errors: false,
            sentry_dsn: None,
        }
    }

    fn create_mock_state() -> Arc<ServerState> {
        let cli = create_mock_cli();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        Arc::new(ServerState {
            db,
            cli,
            runtime: DockerRuntime::connect(None).expect("lazy client"),
            progress: ProgressCache::new(),
        })
    }

    #[test]
    fn test_server_state_configuration() {
        let state = create_mock_state();

        assert!(!state.cli.disable_registration);
        assert!(!state.cli.report_errors);
        assert_eq!(state.cli.stream_max_polls, 120);
        assert_eq!(state.cli.build_image, "node:20-alpine");
    }

    #[test]
    fn test_domain_for_appends_suffix() {
        let state = create_mock_state();

        assert_eq!(state.domain_for("my-app"), "my-app.localhost");
    }

    mod request_tests {
        use crate::requests::*;

        #[test]
        fn test_make_deploy_request_deserialization() {
            let json = r#"{"git_url": "https://github.com/example/repo.git", "project_name": "my-app"}"#;
            let request: MakeDeployRequest = serde_json::from_str(json).unwrap();

            assert_eq!(request.git_url, "https://github.com/example/repo.git");
            assert_eq!(request.project_name, "my-app");
        }

        #[test]
        fn test_deploy_response_serialization() {
            let response = DeployResponse {
                message: "Deployment started for my-app".to_string(),
                status: "Queued".to_string(),
                project: "my-app".to_string(),
            };

            let json = serde_json::to_string(&response).unwrap();
            assert!(json.contains("Deployment started for my-app"));
            assert!(json.contains("Queued"));
        }

        #[test]
        fn test_make_login_request_serialization() {
            let request = MakeLoginRequest {
                loginname: "testuser".to_string(),
                password: "password123".to_string(),
            };

            let json = serde_json::to_string(&request).unwrap();
            assert!(json.contains("testuser"));
            assert!(json.contains("password123"));
        }
    }

    mod stream_event_tests {
        use super::ProjectStatus;
        use crate::requests::StreamEvent;

        #[test]
        fn test_connected_event_shape() {
            let event = StreamEvent::Connected {
                message: "Stream connected".to_string(),
            };
            let json = serde_json::to_value(&event).unwrap();

            assert_eq!(json["type"], "connected");
            assert_eq!(json["message"], "Stream connected");
        }

        #[test]
        fn test_log_event_shape() {
            let event = StreamEvent::Log {
                message: "Cloning repository...".to_string(),
            };
            let json = serde_json::to_value(&event).unwrap();

            assert_eq!(json["type"], "log");
        }

        #[test]
        fn test_status_event_shape() {
            let event = StreamEvent::Status {
                status: ProjectStatus::Building,
                domain: None,
            };
            let json = serde_json::to_value(&event).unwrap();

            assert_eq!(json["type"], "status");
            assert_eq!(json["status"], "Building");
            assert!(json["domain"].is_null());
        }

        #[test]
        fn test_complete_event_shape() {
            let event = StreamEvent::Complete {
                status: ProjectStatus::Live,
                domain: Some("my-app.localhost".to_string()),
                url: Some("http://my-app.localhost".to_string()),
            };
            let json = serde_json::to_value(&event).unwrap();

            assert_eq!(json["type"], "complete");
            assert_eq!(json["status"], "Live");
            assert_eq!(json["domain"], "my-app.localhost");
            assert_eq!(json["url"], "http://my-app.localhost");
        }

        #[test]
        fn test_timeout_event_shape() {
            let event = StreamEvent::Timeout {
                message: "Deployment timeout".to_string(),
            };
            let json = serde_json::to_value(&event).unwrap();

            assert_eq!(json["type"], "timeout");
        }
    }
}
