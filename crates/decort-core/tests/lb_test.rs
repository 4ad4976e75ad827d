#![allow(clippy::unwrap_used)]
// Load balancer reconcilers against a mock platform.

mod common;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_of, lb_json, obj, paths, provider};
use decort_core::{ErrorKind, Operation, PlannedResource, ResourceData};

async fn mount_get(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_ok(server: &MockServer, endpoint: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/restmachine/cloudapi/lb/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(expected)
        .mount(server)
        .await;
}

// ── decort_lb ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_declaration_then_reads_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/create"))
        .and(body_string_contains("rgId=17"))
        .and(body_string_contains("name=lb1"))
        .and(body_string_contains("extnetId=2"))
        .and(body_string_contains("vinsId=44"))
        .and(body_string_contains("start=true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("101"))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, lb_json(101, "CREATED")).await;

    let provider = provider(&server);
    let (_, d) = provider
        .apply(
            "decort_lb",
            None,
            obj(json!({"name": "lb1", "rg_id": 17, "extnet_id": 2, "vins_id": 44, "start": true})),
        )
        .await
        .unwrap();

    assert_eq!(d.id(), Some("101"));
    assert_eq!(
        paths(&server).await,
        vec!["/cloudapi/lb/create", "/cloudapi/lb/get"]
    );
    assert!(!body_of(&server, "/lb/create").await.contains("desc"));

    let state = d.state();
    assert_eq!(state.get("lb_id"), Some(&json!(101)));
    assert_eq!(state.get("status"), Some(&json!("CREATED")));
    assert_eq!(state.get("started"), Some(&json!(true)));
    assert_eq!(state.get("permanently"), Some(&json!(false)));
}

#[tokio::test]
async fn test_create_applies_enable_after_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/create"))
        .respond_with(ResponseTemplate::new(200).set_body_string("101"))
        .mount(&server)
        .await;
    mount_get(&server, lb_json(101, "CREATED")).await;
    mount_ok(&server, "disable", 1).await;
    mount_ok(&server, "enable", 0).await;

    let provider = provider(&server);
    let conf = json!({
        "name": "lb1", "rg_id": 17, "extnet_id": 2, "vins_id": 44,
        "start": false, "enable": false
    });
    provider.apply("decort_lb", None, obj(conf)).await.unwrap();

    assert_eq!(
        paths(&server).await,
        vec!["/cloudapi/lb/create", "/cloudapi/lb/get", "/cloudapi/lb/disable"]
    );
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(101, "ENABLED")).await;
    let provider = provider(&server);

    let mut first = ResourceData::from_state("101", Default::default());
    provider
        .invoke("decort_lb", Operation::Read, &mut first)
        .await
        .unwrap();
    let mut second = ResourceData::from_state("101", first.state());
    provider
        .invoke("decort_lb", Operation::Read, &mut second)
        .await
        .unwrap();

    let a = serde_json::to_string(&first.state()).unwrap();
    let b = serde_json::to_string(&second.state()).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_read_clears_id_when_platform_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/get"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Load balancer with id 101 not found"))
        .mount(&server)
        .await;
    let provider = provider(&server);

    let mut d = ResourceData::from_state("101", Default::default());
    provider
        .invoke("decort_lb", Operation::Read, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_read_clears_id_on_destroyed_status() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(101, "DESTROYED")).await;
    let provider = provider(&server);

    let mut d = ResourceData::from_state("101", Default::default());
    provider
        .invoke("decort_lb", Operation::Read, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_read_surfaces_other_platform_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/get"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;
    let provider = provider(&server);

    let mut d = ResourceData::from_state("101", Default::default());
    let err = provider
        .invoke("decort_lb", Operation::Read, &mut d)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiError);
    assert_eq!(d.id(), Some("101"));
}

#[tokio::test]
async fn test_update_issues_setters_in_order() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(101, "ENABLED")).await;
    mount_ok(&server, "restore", 1).await;
    mount_ok(&server, "stop", 1).await;
    mount_ok(&server, "update", 1).await;
    mount_ok(&server, "restart", 1).await;
    mount_ok(&server, "configReset", 0).await;
    mount_ok(&server, "enable", 0).await;

    let prior = obj(json!({
        "name": "lb1", "rg_id": 17, "extnet_id": 2, "vins_id": 44,
        "start": true, "desc": "", "enable": true, "restore": false, "restart": false,
        "permanently": false
    }));
    let conf = json!({
        "name": "lb1", "rg_id": 17, "extnet_id": 2, "vins_id": 44,
        "start": false, "desc": "edge", "enable": true, "restore": true, "restart": true
    });
    let provider = provider(&server);
    let (action, d) = provider
        .apply("decort_lb", Some(("101".into(), prior)), obj(conf))
        .await
        .unwrap();

    assert_eq!(action.to_string(), "update");
    assert_eq!(d.id(), Some("101"));
    assert_eq!(
        paths(&server).await,
        vec![
            "/cloudapi/lb/restore",
            "/cloudapi/lb/stop",
            "/cloudapi/lb/update",
            "/cloudapi/lb/restart",
            "/cloudapi/lb/get",
        ]
    );
    assert!(body_of(&server, "/lb/update").await.contains("desc=edge"));
}

#[tokio::test]
async fn test_delete_sends_permanently_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/delete"))
        .and(body_string_contains("lbId=101"))
        .and(body_string_contains("permanently=true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    let provider = provider(&server);

    let mut d = ResourceData::from_state("101", obj(json!({"permanently": true})));
    provider
        .invoke("decort_lb", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_data_source_flattens_balancer() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(101, "ENABLED")).await;
    let provider = provider(&server);

    let d = provider
        .read_data_source("decort_lb", obj(json!({"lb_id": 101})))
        .await
        .unwrap();
    let state = d.state();
    assert_eq!(d.id(), Some("101"));
    assert_eq!(state.get("name"), Some(&json!("lb1")));
    assert_eq!(state.get("ha_mode"), Some(&json!(false)));
    assert_eq!(
        state
            .get("backends")
            .and_then(|b| b.get(0))
            .and_then(|b| b.get("name")),
        Some(&json!("b1"))
    );
}

// ── decort_lb_backend ───────────────────────────────────────────────

#[tokio::test]
async fn test_backend_update_sends_only_changed_algorithm() {
    let server = MockServer::start().await;
    let mut lb = lb_json(10, "ENABLED");
    lb["backends"][0]["algorithm"] = json!("leastconn");
    mount_get(&server, lb).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/backendUpdate"))
        .and(body_string_contains("lbId=10"))
        .and(body_string_contains("backendName=b1"))
        .and(body_string_contains("algorithm=leastconn"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "backendServerAdd", 0).await;
    mount_ok(&server, "backendServerUpdate", 0).await;
    mount_ok(&server, "backendServerDelete", 0).await;

    let prior = obj(json!({
        "lb_id": 10, "name": "b1", "algorithm": "roundrobin",
        "inter": 5000, "rise": 2, "fall": 3, "weight": 100
    }));
    let conf = json!({"lb_id": 10, "name": "b1", "algorithm": "leastconn"});
    let provider = provider(&server);
    let (_, d) = provider
        .apply("decort_lb_backend", Some(("10#b1".into(), prior)), obj(conf))
        .await
        .unwrap();

    let body = body_of(&server, "/lb/backendUpdate").await;
    for setting in ["inter", "rise", "fall", "weight"] {
        assert!(!body.contains(setting), "unexpected {setting} in {body}");
    }
    assert_eq!(d.state().get("algorithm"), Some(&json!("leastconn")));
}

#[tokio::test]
async fn test_backend_update_skips_call_without_changes() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    mount_ok(&server, "backendUpdate", 0).await;

    let prior = obj(json!({"lb_id": 10, "name": "b1", "algorithm": "roundrobin"}));
    let conf = json!({"lb_id": 10, "name": "b1", "algorithm": "roundrobin"});
    provider(&server)
        .apply("decort_lb_backend", Some(("10#b1".into(), prior)), obj(conf))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_backend_delete_refuses_while_frontend_uses_it() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    mount_ok(&server, "backendDelete", 0).await;
    mount_ok(&server, "frontendDelete", 0).await;
    let provider = provider(&server);

    let mut backend = ResourceData::from_state("10#b1", obj(json!({"lb_id": 10, "name": "b1"})));
    let err = provider
        .invoke("decort_lb_backend", Operation::Delete, &mut backend)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("f1"));
    assert_eq!(backend.id(), Some("10#b1"));

    let mut frontend = ResourceData::from_state(
        "10#f1",
        obj(json!({"lb_id": 10, "name": "f1", "backend_name": "b1"})),
    );
    provider
        .invoke("decort_lb_frontend", Operation::Read, &mut frontend)
        .await
        .unwrap();
    assert_eq!(frontend.id(), Some("10#f1"));
}

#[tokio::test]
async fn test_backend_delete_is_noop_when_backend_already_gone() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    mount_ok(&server, "backendDelete", 0).await;

    let mut d = ResourceData::from_state("10#b9", obj(json!({"lb_id": 10, "name": "b9"})));
    provider(&server)
        .invoke("decort_lb_backend", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

// ── decort_lb_backend_server ────────────────────────────────────────

#[tokio::test]
async fn test_server_update_sends_identity_and_changed_check() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/backendServerUpdate"))
        .and(body_string_contains("lbId=10"))
        .and(body_string_contains("backendName=b1"))
        .and(body_string_contains("serverName=s1"))
        .and(body_string_contains("address=10.0.0.10"))
        .and(body_string_contains("port=8080"))
        .and(body_string_contains("check=disabled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let prior = obj(json!({
        "lb_id": 10, "backend_name": "b1", "name": "s1",
        "address": "10.0.0.10", "port": 8080, "check": "enabled", "weight": 100
    }));
    let conf = json!({
        "lb_id": 10, "backend_name": "b1", "name": "s1",
        "address": "10.0.0.10", "port": 8080, "check": "disabled"
    });
    provider(&server)
        .apply("decort_lb_backend_server", Some(("10-b1-s1".into(), prior)), obj(conf))
        .await
        .unwrap();

    assert!(!body_of(&server, "/lb/backendServerUpdate").await.contains("weight"));
}

#[tokio::test]
async fn test_server_read_parses_legacy_id() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;

    let mut d = ResourceData::from_state("10-b1-s1", Default::default());
    provider(&server)
        .invoke("decort_lb_backend_server", Operation::Read, &mut d)
        .await
        .unwrap();
    let state = d.state();
    assert_eq!(state.get("address"), Some(&json!("10.0.0.10")));
    assert_eq!(state.get("port"), Some(&json!(8080)));
}

// ── decort_lb_frontend and bindings ─────────────────────────────────

#[tokio::test]
async fn test_frontend_create_requires_existing_backend() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    mount_ok(&server, "frontendCreate", 0).await;

    let conf = json!({"lb_id": 10, "name": "f2", "backend_name": "missing"});
    let err = provider(&server)
        .apply("decort_lb_frontend", None, obj(conf))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(err.to_string().contains("missing"));
}

#[tokio::test]
async fn test_binding_create_posts_address_and_port() {
    let server = MockServer::start().await;
    mount_get(&server, lb_json(10, "ENABLED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/lb/frontendBind"))
        .and(body_string_contains("lbId=10"))
        .and(body_string_contains("frontendName=f1"))
        .and(body_string_contains("bindingName=http"))
        .and(body_string_contains("bindingAddress=185.0.0.2"))
        .and(body_string_contains("bindingPort=80"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let conf = json!({
        "lb_id": 10, "frontend_name": "f1", "name": "http",
        "address": "185.0.0.2", "port": 80
    });
    let (_, d) = provider(&server)
        .apply("decort_lb_frontend_bind", None, obj(conf))
        .await
        .unwrap();
    assert_eq!(d.id(), Some("10#f1#http"));
}

// ── Plan checks ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_plan_rejects_duplicate_server_names() {
    let server = MockServer::start().await;
    let provider = provider(&server);
    let server_conf = |address: &str| {
        obj(json!({
            "lb_id": 10, "backend_name": "b1", "name": "s1",
            "address": address, "port": 8080
        }))
    };
    let planned = vec![
        PlannedResource::new("decort_lb_backend_server", server_conf("10.0.0.10")),
        PlannedResource::new("decort_lb_backend_server", server_conf("10.0.0.11")),
    ];

    let err = provider.check_plan(&planned).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_plan_keeps_dashed_server_names_apart() {
    let server = MockServer::start().await;
    let server_conf = |backend: &str, name: &str| {
        obj(json!({
            "lb_id": 10, "backend_name": backend, "name": name,
            "address": "10.0.0.10", "port": 8080
        }))
    };
    let planned = vec![
        PlannedResource::new("decort_lb_backend_server", server_conf("web-be", "s1")),
        PlannedResource::new("decort_lb_backend_server", server_conf("web", "be-s1")),
    ];

    provider(&server).check_plan(&planned).unwrap();
}
