#![allow(clippy::unwrap_used)]
// Disk and snapshot reconcilers against a mock platform.

mod common;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_of, disk_json, obj, paths, provider, provider_with};
use decort_core::{AttrMap, ErrorKind, Operation, PlannedResource, ProviderOptions, ResourceData};

async fn mount_get(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_ok(server: &MockServer, endpoint: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/restmachine/cloudapi/disks/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(expected)
        .mount(server)
        .await;
}

fn disk_config(size_max: u64) -> AttrMap {
    obj(json!({"account_id": 3, "gid": 212, "disk_name": "data0", "size_max": size_max}))
}

/// State as the host would hold it after a previous apply.
fn disk_state(size_max: u64) -> AttrMap {
    let mut state = disk_config(size_max);
    state.insert("type".into(), json!("D"));
    state.insert("status".into(), json!("CREATED"));
    state.insert("detach".into(), json!(false));
    state.insert("permanently".into(), json!(false));
    state.insert(
        "iotune".into(),
        json!([{
            "read_bytes_sec": 0, "read_bytes_sec_max": 0,
            "read_iops_sec": 100, "read_iops_sec_max": 0,
            "size_iops_sec": 0,
            "total_bytes_sec": -1, "total_bytes_sec_max": 0,
            "total_iops_sec": 0, "total_iops_sec_max": 0,
            "write_bytes_sec": 0, "write_bytes_sec_max": 0,
            "write_iops_sec": 0, "write_iops_sec_max": 0
        }]),
    );
    state
}

// ── Create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_applies_iotune_and_share_before_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/create"))
        .and(body_string_contains("accountId=3"))
        .and(body_string_contains("gid=212"))
        .and(body_string_contains("name=data0"))
        .and(body_string_contains("size=10"))
        .and(body_string_contains("type=D"))
        .respond_with(ResponseTemplate::new(200).set_body_string("55"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/limitIO"))
        .and(body_string_contains("diskId=55"))
        .and(body_string_contains("read_iops_sec=100"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "share", 1).await;
    let mut disk = disk_json(55, 10, "CREATED");
    disk["shareable"] = json!(true);
    mount_get(&server, disk).await;

    let mut conf = disk_config(10);
    conf.insert("iotune".into(), json!([{"read_iops_sec": 100}]));
    conf.insert("shareable".into(), json!(true));
    let (_, d) = provider(&server).apply("decort_disk", None, conf).await.unwrap();

    assert_eq!(d.id(), Some("55"));
    assert_eq!(
        paths(&server).await,
        vec![
            "/cloudapi/disks/create",
            "/cloudapi/disks/limitIO",
            "/cloudapi/disks/share",
            "/cloudapi/disks/get",
        ]
    );
    assert_eq!(d.state().get("shareable"), Some(&json!(true)));
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_size_increase_calls_resize() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/resize2"))
        .and(body_string_contains("diskId=55"))
        .and(body_string_contains("size=20"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, disk_json(55, 20, "CREATED")).await;

    let (action, d) = provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(10))), disk_config(20))
        .await
        .unwrap();

    assert_eq!(action.to_string(), "update");
    assert_eq!(d.state().get("size_max"), Some(&json!(20)));
}

#[tokio::test]
async fn test_size_decrease_is_rejected_without_calls() {
    let server = MockServer::start().await;
    mount_ok(&server, "resize2", 0).await;
    mount_ok(&server, "get", 0).await;

    let err = provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(20))), disk_config(10))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(err.to_string().contains("reducing disk size is not allowed"));
    assert!(paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_rename_posts_new_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/rename"))
        .and(body_string_contains("diskId=55"))
        .and(body_string_contains("name=data1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, disk_json(55, 10, "CREATED")).await;

    let mut conf = disk_config(10);
    conf.insert("disk_name".into(), json!("data1"));
    provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(10))), conf)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_iotune_zero_matches_platform_unlimited() {
    let server = MockServer::start().await;
    mount_ok(&server, "limitIO", 0).await;
    mount_get(&server, disk_json(55, 10, "CREATED")).await;

    let mut conf = disk_config(10);
    conf.insert(
        "iotune".into(),
        json!([{"read_iops_sec": 100, "total_bytes_sec": 0}]),
    );
    provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(10))), conf)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_iotune_change_keeps_unlimited_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/limitIO"))
        .and(body_string_contains("diskId=55"))
        .and(body_string_contains("read_iops_sec=200"))
        .and(body_string_contains("total_bytes_sec=-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, disk_json(55, 10, "CREATED")).await;

    let mut conf = disk_config(10);
    conf.insert("iotune".into(), json!([{"read_iops_sec": 200}]));
    provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(10))), conf)
        .await
        .unwrap();

    let body = body_of(&server, "/disks/limitIO").await;
    assert!(body.contains("write_iops_sec=0"));
}

#[tokio::test]
async fn test_type_change_forces_replacement() {
    let server = MockServer::start().await;
    mount_ok(&server, "delete", 1).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/create"))
        .and(body_string_contains("type=B"))
        .respond_with(ResponseTemplate::new(200).set_body_string("56"))
        .expect(1)
        .mount(&server)
        .await;
    let mut boot = disk_json(56, 10, "CREATED");
    boot["type"] = json!("B");
    mount_get(&server, boot).await;

    let mut conf = disk_config(10);
    conf.insert("type".into(), json!("B"));
    let (action, d) = provider(&server)
        .apply("decort_disk", Some(("55".into(), disk_state(10))), conf)
        .await
        .unwrap();

    assert_eq!(action.to_string(), "replace");
    assert_eq!(d.id(), Some("56"));
    assert_eq!(
        paths(&server).await,
        vec![
            "/cloudapi/disks/delete",
            "/cloudapi/disks/create",
            "/cloudapi/disks/get",
        ]
    );
}

// ── Read ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_restores_soft_deleted_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(disk_json(55, 10, "DELETED")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, disk_json(55, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/restore"))
        .and(body_string_contains("diskId=55"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = ResourceData::from_state("55", disk_state(10));
    provider(&server)
        .invoke("decort_disk", Operation::Read, &mut d)
        .await
        .unwrap();

    assert_eq!(d.id(), Some("55"));
    assert_eq!(d.state().get("status"), Some(&json!("CREATED")));
    assert_eq!(
        paths(&server).await,
        vec![
            "/cloudapi/disks/get",
            "/cloudapi/disks/restore",
            "/cloudapi/disks/get",
        ]
    );
}

#[tokio::test]
async fn test_read_clears_id_for_destroyed_disk_by_default() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(55, 10, "DESTROYED")).await;
    mount_ok(&server, "create", 0).await;

    let mut d = ResourceData::from_state("55", disk_state(10));
    provider(&server)
        .invoke("decort_disk", Operation::Read, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_read_recreates_destroyed_disk_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/get"))
        .and(body_string_contains("diskId=55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(disk_json(55, 10, "PURGED")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/get"))
        .and(body_string_contains("diskId=57"))
        .respond_with(ResponseTemplate::new(200).set_body_json(disk_json(57, 10, "CREATED")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/create"))
        .respond_with(ResponseTemplate::new(200).set_body_string("57"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/limitIO"))
        .and(body_string_contains("diskId=57"))
        .and(body_string_contains("read_iops_sec=100"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let options = ProviderOptions {
        recreate_destroyed_disks: true,
    };
    let mut d = ResourceData::from_state("55", disk_state(10));
    provider_with(&server, options)
        .invoke("decort_disk", Operation::Read, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), Some("57"));
    assert_eq!(d.state().get("disk_id"), Some(&json!(57)));
}

#[tokio::test]
async fn test_recreate_happens_once_per_read() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(55, 10, "DESTROYED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/create"))
        .respond_with(ResponseTemplate::new(200).set_body_string("57"))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "limitIO", 1).await;

    let options = ProviderOptions {
        recreate_destroyed_disks: true,
    };
    let mut d = ResourceData::from_state("55", disk_state(10));
    let err = provider_with(&server, options)
        .invoke("decort_disk", Operation::Read, &mut d)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(55, 10, "CREATED")).await;
    let provider = provider(&server);

    let mut first = ResourceData::from_state("55", disk_state(10));
    provider
        .invoke("decort_disk", Operation::Read, &mut first)
        .await
        .unwrap();
    let mut second = ResourceData::from_state("55", first.state());
    provider
        .invoke("decort_disk", Operation::Read, &mut second)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first.state()).unwrap(),
        serde_json::to_string(&second.state()).unwrap()
    );
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_posts_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/delete"))
        .and(body_string_contains("diskId=55"))
        .and(body_string_contains("detach=true"))
        .and(body_string_contains("permanently=false"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = disk_state(10);
    state.insert("detach".into(), json!(true));
    let mut d = ResourceData::from_state("55", state);
    provider(&server)
        .invoke("decort_disk", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_delete_of_destroyed_disk_makes_no_call() {
    let server = MockServer::start().await;
    mount_ok(&server, "delete", 0).await;

    let mut state = disk_state(10);
    state.insert("status".into(), json!("DESTROYED"));
    let mut d = ResourceData::from_state("55", state);
    provider(&server)
        .invoke("decort_disk", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_delete_treats_not_found_as_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/delete"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = ResourceData::from_state("55", disk_state(10));
    provider(&server)
        .invoke("decort_disk", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

// ── decort_disk_snapshot ────────────────────────────────────────────

fn snapshot_state(rollback: bool) -> AttrMap {
    obj(json!({
        "disk_id": 77,
        "label": "pre-upgrade",
        "rollback": rollback,
        "timestamp": 1_700_000_000,
        "guid": "snap-1"
    }))
}

#[tokio::test]
async fn test_snapshot_rollback_sends_label_and_timestamp() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/snapshotRollback"))
        .and(body_string_contains("diskId=77"))
        .and(body_string_contains("label=pre-upgrade"))
        .and(body_string_contains("timestamp=1700000000"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let conf = obj(json!({"disk_id": 77, "label": "pre-upgrade", "rollback": true}));
    let (_, d) = provider(&server)
        .apply(
            "decort_disk_snapshot",
            Some(("77#pre-upgrade".into(), snapshot_state(false))),
            conf,
        )
        .await
        .unwrap();

    let state = d.state();
    assert_eq!(state.get("timestamp"), Some(&json!(1_700_000_000)));
    assert_eq!(state.get("guid"), Some(&json!("snap-1")));
}

#[tokio::test]
async fn test_snapshot_create_adopts_existing_label() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/snapshotRollback"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(0)
        .mount(&server)
        .await;

    let conf = obj(json!({"disk_id": 77, "label": "pre-upgrade"}));
    let (_, d) = provider(&server)
        .apply("decort_disk_snapshot", None, conf)
        .await
        .unwrap();
    assert_eq!(d.id(), Some("77#pre-upgrade"));
    assert_eq!(d.state().get("snap_set_guid"), Some(&json!("set-1")));
}

#[tokio::test]
async fn test_snapshot_create_with_rollback_uses_platform_timestamp() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/snapshotRollback"))
        .and(body_string_contains("diskId=77"))
        .and(body_string_contains("label=pre-upgrade"))
        .and(body_string_contains("timestamp=1700000000"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let conf = obj(json!({"disk_id": 77, "label": "pre-upgrade", "rollback": true}));
    let (_, d) = provider(&server)
        .apply("decort_disk_snapshot", None, conf)
        .await
        .unwrap();

    assert_eq!(d.id(), Some("77#pre-upgrade"));
    assert_eq!(
        paths(&server).await,
        vec![
            "/cloudapi/disks/get",
            "/cloudapi/disks/snapshotRollback",
            "/cloudapi/disks/get",
        ]
    );
    assert_eq!(d.state().get("timestamp"), Some(&json!(1_700_000_000)));
}

#[tokio::test]
async fn test_snapshot_rollback_refused_by_platform_is_api_error() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/snapshotRollback"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .expect(1)
        .mount(&server)
        .await;

    let conf = obj(json!({"disk_id": 77, "label": "pre-upgrade", "rollback": true}));
    let err = provider(&server)
        .apply("decort_disk_snapshot", None, conf)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiError);
}

#[tokio::test]
async fn test_snapshot_create_fails_for_unknown_label() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;

    let conf = obj(json!({"disk_id": 77, "label": "nightly"}));
    let err = provider(&server)
        .apply("decort_disk_snapshot", None, conf)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_snapshot_delete_succeeds_when_disk_gone() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "DESTROYED")).await;
    mount_ok(&server, "snapshotDelete", 0).await;

    let mut d = ResourceData::from_state("77#pre-upgrade", snapshot_state(false));
    provider(&server)
        .invoke("decort_disk_snapshot", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_snapshot_delete_posts_label() {
    let server = MockServer::start().await;
    mount_get(&server, disk_json(77, 10, "CREATED")).await;
    Mock::given(method("POST"))
        .and(path("/restmachine/cloudapi/disks/snapshotDelete"))
        .and(body_string_contains("diskId=77"))
        .and(body_string_contains("label=pre-upgrade"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = ResourceData::from_state("77#pre-upgrade", snapshot_state(false));
    provider(&server)
        .invoke("decort_disk_snapshot", Operation::Delete, &mut d)
        .await
        .unwrap();
    assert_eq!(d.id(), None);
}

#[tokio::test]
async fn test_plan_rejects_duplicate_snapshot_labels() {
    let server = MockServer::start().await;
    let snapshot = || obj(json!({"disk_id": 77, "label": "pre-upgrade"}));
    let planned = vec![
        PlannedResource::new("decort_disk_snapshot", snapshot()),
        PlannedResource::new("decort_disk_snapshot", snapshot()),
    ];

    let err = provider(&server).check_plan(&planned).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("77#pre-upgrade"));
    assert!(paths(&server).await.is_empty());
}
