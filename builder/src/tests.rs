/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::deploy::{DeployBusy, promote_build_output};
    use crate::detect::{BuildStrategy, Framework, detect_framework, has_manifest};
    use crate::ports::allocate_port;
    use crate::proxy::render_vhost;
    use crate::reconcile::{ContainerState, ManagedContainer, reconcile};
    use anyhow::Result;
    use async_trait::async_trait;
    use slipway_core::cache::ProgressCache;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct FakeContainer {
        name: String,
        running: bool,
        networks: HashMap<String, String>,
    }

    #[derive(Debug, Default)]
    struct FakeState {
        containers: Vec<FakeContainer>,
        networks: HashMap<String, String>,
        actions: Vec<String>,
    }

    /// Controllable container/network state standing in for the daemon.
    struct FakeRuntime {
        state: Mutex<FakeState>,
        fail_start: Option<String>,
    }

    impl FakeRuntime {
        fn new(containers: Vec<FakeContainer>, networks: &[(&str, &str)]) -> Self {
            Self {
                state: Mutex::new(FakeState {
                    containers,
                    networks: networks
                        .iter()
                        .map(|(name, id)| (name.to_string(), id.to_string()))
                        .collect(),
                    actions: Vec::new(),
                }),
                fail_start: None,
            }
        }

        fn actions(&self) -> Vec<String> {
            self.state.lock().unwrap().actions.clone()
        }

        fn container(&self, name: &str) -> FakeContainer {
            self.state
                .lock()
                .unwrap()
                .containers
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl ContainerState for FakeRuntime {
        async fn managed_containers(&self) -> Result<Vec<ManagedContainer>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .containers
                .iter()
                .map(|c| ManagedContainer {
                    name: c.name.clone(),
                    running: c.running,
                })
                .collect())
        }

        async fn attached_networks(&self, container: &str) -> Result<HashMap<String, String>> {
            let state = self.state.lock().unwrap();
            let container = state
                .containers
                .iter()
                .find(|c| c.name == container)
                .ok_or_else(|| anyhow::anyhow!("no such container"))?;
            Ok(container.networks.clone())
        }

        async fn ensure_network(&self, network: &str) -> Result<String> {
            let mut state = self.state.lock().unwrap();
            if let Some(id) = state.networks.get(network) {
                return Ok(id.clone());
            }
            let id = format!("id-{}", network);
            state.networks.insert(network.to_string(), id.clone());
            state.actions.push(format!("create-network {}", network));
            Ok(id)
        }

        async fn disconnect(&self, network: &str, container: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some(c) = state.containers.iter_mut().find(|c| c.name == container) {
                c.networks.remove(network);
            }
            state
                .actions
                .push(format!("disconnect {} {}", container, network));
            Ok(())
        }

        async fn connect(&self, network: &str, container: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let id = state
                .networks
                .get(network)
                .ok_or_else(|| anyhow::anyhow!("no such network"))?
                .clone();
            if let Some(c) = state.containers.iter_mut().find(|c| c.name == container) {
                c.networks.insert(network.to_string(), id);
            }
            state
                .actions
                .push(format!("connect {} {}", container, network));
            Ok(())
        }

        async fn start(&self, container: &str) -> Result<()> {
            if self.fail_start.as_deref() == Some(container) {
                anyhow::bail!("daemon refused to start {}", container);
            }
            let mut state = self.state.lock().unwrap();
            if let Some(c) = state.containers.iter_mut().find(|c| c.name == container) {
                c.running = true;
            }
            state.actions.push(format!("start {}", container));
            Ok(())
        }
    }

    fn stopped(name: &str, networks: &[(&str, &str)]) -> FakeContainer {
        FakeContainer {
            name: name.to_string(),
            running: false,
            networks: networks
                .iter()
                .map(|(n, id)| (n.to_string(), id.to_string()))
                .collect(),
        }
    }

    fn running(name: &str, networks: &[(&str, &str)]) -> FakeContainer {
        FakeContainer {
            running: true,
            ..stopped(name, networks)
        }
    }

    #[tokio::test]
    async fn test_reconcile_starts_stopped_containers() {
        let runtime = FakeRuntime::new(
            vec![
                running("slipway-app-one", &[("slipway-net", "net-1")]),
                stopped("slipway-app-two", &[("slipway-net", "net-1")]),
            ],
            &[("slipway-net", "net-1")],
        );
        let progress = ProgressCache::new();

        let report = reconcile(&runtime, "slipway-net", &progress).await.unwrap();

        assert_eq!(report.already_running, 1);
        assert_eq!(report.started, 1);
        assert_eq!(report.healed, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(runtime.actions(), vec!["start slipway-app-two"]);
    }

    #[tokio::test]
    async fn test_reconcile_heals_stale_network_attachment() {
        // The network was recreated: same name, fresh id. The container
        // still points at the stale id and must be re-attached.
        let runtime = FakeRuntime::new(
            vec![stopped("slipway-app-one", &[("slipway-net", "stale-id")])],
            &[("slipway-net", "net-2")],
        );
        let progress = ProgressCache::new();

        let report = reconcile(&runtime, "slipway-net", &progress).await.unwrap();

        assert_eq!(report.started, 1);
        assert_eq!(report.healed, 1);
        assert_eq!(
            runtime.actions(),
            vec![
                "disconnect slipway-app-one slipway-net",
                "connect slipway-app-one slipway-net",
                "start slipway-app-one",
            ]
        );
        assert_eq!(
            runtime.container("slipway-app-one").networks.get("slipway-net"),
            Some(&"net-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_reconcile_creates_missing_network() {
        let runtime = FakeRuntime::new(vec![], &[]);
        let progress = ProgressCache::new();

        let report = reconcile(&runtime, "slipway-net", &progress).await.unwrap();

        assert_eq!(report, Default::default());
        assert_eq!(runtime.actions(), vec!["create-network slipway-net"]);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let runtime = FakeRuntime::new(
            vec![
                stopped("slipway-app-one", &[("old-net", "stale-id")]),
                stopped("slipway-app-two", &[("slipway-net", "net-1")]),
            ],
            &[("slipway-net", "net-1")],
        );
        let progress = ProgressCache::new();

        let first = reconcile(&runtime, "slipway-net", &progress).await.unwrap();
        assert_eq!(first.started, 2);
        assert_eq!(first.healed, 1);

        let actions_after_first = runtime.actions().len();

        // With no intervening deployments the second pass changes nothing.
        let second = reconcile(&runtime, "slipway-net", &progress).await.unwrap();
        assert_eq!(second.already_running, 2);
        assert_eq!(second.started, 0);
        assert_eq!(second.healed, 0);
        assert_eq!(second.failed, 0);
        assert_eq!(runtime.actions().len(), actions_after_first);
    }

    #[tokio::test]
    async fn test_reconcile_isolates_per_container_failures() {
        let mut runtime = FakeRuntime::new(
            vec![
                stopped("slipway-app-bad", &[("slipway-net", "net-1")]),
                stopped("slipway-app-good", &[("slipway-net", "net-1")]),
            ],
            &[("slipway-net", "net-1")],
        );
        runtime.fail_start = Some("slipway-app-bad".to_string());
        let progress = ProgressCache::new();

        let report = reconcile(&runtime, "slipway-net", &progress).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.started, 1);
        assert!(runtime.container("slipway-app-good").running);
        assert!(!runtime.container("slipway-app-bad").running);
    }

    #[tokio::test]
    async fn test_reconcile_leaves_in_flight_deployments_alone() {
        let runtime = FakeRuntime::new(
            vec![stopped("slipway-app-busy", &[("slipway-net", "net-1")])],
            &[("slipway-net", "net-1")],
        );
        let progress = ProgressCache::new();

        // A deployment for the project holds the run guard
        assert!(progress.try_begin("busy"));

        let report = reconcile(&runtime, "slipway-net", &progress).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.started, 0);
        assert!(runtime.actions().is_empty());
        // The guard still belongs to the deployment
        assert!(progress.is_running("busy"));
    }

    #[test]
    fn test_detect_framework() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_framework(dir.path()), Framework::Unknown);

        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        assert_eq!(detect_framework(dir.path()), Framework::StaticHtml);

        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_framework(dir.path()), Framework::React);

        fs::write(dir.path().join("vue.config.js"), "").unwrap();
        assert_eq!(detect_framework(dir.path()), Framework::Vue);

        // Next wins over Vue when both configs are present
        fs::write(dir.path().join("next.config.js"), "").unwrap();
        assert_eq!(detect_framework(dir.path()), Framework::NextJs);
    }

    #[test]
    fn test_framework_strategy() {
        assert_eq!(Framework::NextJs.strategy(), BuildStrategy::Server);
        assert_eq!(Framework::React.strategy(), BuildStrategy::Static);
        assert_eq!(Framework::Vue.strategy(), BuildStrategy::Static);
        assert_eq!(Framework::StaticHtml.strategy(), BuildStrategy::Static);
        assert_eq!(Framework::Unknown.strategy(), BuildStrategy::Static);
    }

    #[test]
    fn test_has_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_manifest(dir.path()));

        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert!(has_manifest(dir.path()));
    }

    #[tokio::test]
    async fn test_promote_build_output_isolates_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("package.json"), "{}").unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/App.jsx"), "export default 1").unwrap();
        fs::create_dir(root.join("dist")).unwrap();
        fs::write(root.join("dist/index.html"), "<html></html>").unwrap();
        fs::create_dir(root.join("dist/assets")).unwrap();
        fs::write(root.join("dist/assets/app.js"), "1").unwrap();

        let promoted = promote_build_output(root).await.unwrap();
        assert_eq!(promoted, Some("dist"));

        // The root now holds exactly the dist contents, nothing else
        let mut entries: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["assets", "index.html"]);
        assert_eq!(
            fs::read_to_string(root.join("assets/app.js")).unwrap(),
            "1"
        );
    }

    #[tokio::test]
    async fn test_promote_build_output_prefers_dist_over_build() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir(root.join("dist")).unwrap();
        fs::write(root.join("dist/index.html"), "dist").unwrap();
        fs::create_dir(root.join("build")).unwrap();
        fs::write(root.join("build/index.html"), "build").unwrap();

        let promoted = promote_build_output(root).await.unwrap();
        assert_eq!(promoted, Some("dist"));
        assert_eq!(
            fs::read_to_string(root.join("index.html")).unwrap(),
            "dist"
        );
    }

    #[tokio::test]
    async fn test_promote_build_output_without_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("index.html"), "<html></html>").unwrap();

        let promoted = promote_build_output(root).await.unwrap();
        assert_eq!(promoted, None);
        // Degraded path leaves the tree untouched
        assert!(root.join("index.html").is_file());
    }

    #[test]
    fn test_allocate_port_returns_distinct_free_ports() {
        let port = allocate_port().unwrap();
        assert!(port > 0);

        // The released port must be bindable again
        std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn test_render_vhost() {
        let vhost = render_vhost("my-app", "slipway-app-my-app", 4173, ".localhost");

        assert!(vhost.contains("server_name my-app.localhost;"));
        assert!(vhost.contains("resolver 127.0.0.11 valid=10s;"));
        assert!(vhost.contains("set $upstream http://slipway-app-my-app:4173;"));
        assert!(vhost.contains("proxy_set_header Upgrade $http_upgrade;"));
    }

    #[test]
    fn test_deploy_busy_message() {
        let busy = DeployBusy {
            project: "my-app".to_string(),
        };
        assert_eq!(
            busy.to_string(),
            "A deployment for 'my-app' is already in progress"
        );
    }
}
