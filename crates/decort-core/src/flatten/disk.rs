use serde_json::{Value, json};

use super::{Reader, json_text, nested, object, records};
use crate::error::CoreError;
use crate::host::data::AttrMap;
use crate::model::{Disk, IoTune, Snapshot};

pub fn flatten_disk(disk: &Disk) -> AttrMap {
    object(json!({
        "disk_id": disk.id,
        "account_id": disk.account_id,
        "account_name": disk.account_name,
        "gid": disk.gid,
        "disk_name": disk.name,
        "desc": disk.desc,
        "type": disk.disk_type.to_string(),
        "size_max": disk.size_max,
        "size_used": disk.size_used,
        "sep_id": disk.sep_id,
        "sep_type": disk.sep_type,
        "pool": disk.pool,
        "image_id": disk.image_id,
        "parent_id": disk.parent_id,
        "res_id": disk.res_id,
        "res_name": disk.res_name,
        "role": disk.role,
        "order": disk.order,
        "params": disk.params,
        "shareable": disk.shareable,
        "iotune": nested(flatten_iotune(&disk.iotune)),
        "acl": json_text(&disk.acl),
        "status": disk.status,
        "tech_status": disk.tech_status,
        "created_time": disk.created_time,
        "deleted_time": disk.deleted_time,
        "destruction_time": disk.destruction_time,
        "purge_time": disk.purge_time,
        "snapshots": records(disk.snapshots.iter().map(flatten_snapshot)),
    }))
}

pub fn expand_disk(map: &AttrMap) -> Result<Disk, CoreError> {
    let r = Reader::new(map, "disk");
    Ok(Disk {
        id: r.u64("disk_id")?,
        account_id: r.u64("account_id")?,
        account_name: r.string("account_name")?,
        gid: r.u64("gid")?,
        name: r.string("disk_name")?,
        desc: r.string("desc")?,
        disk_type: r.parsed("type")?,
        size_max: r.u64("size_max")?,
        size_used: r.f64("size_used")?,
        sep_id: r.u64("sep_id")?,
        sep_type: r.string("sep_type")?,
        pool: r.string("pool")?,
        image_id: r.u64("image_id")?,
        parent_id: r.u64("parent_id")?,
        res_id: r.string("res_id")?,
        res_name: r.string("res_name")?,
        role: r.string("role")?,
        order: r.u64("order")?,
        params: r.string("params")?,
        shareable: r.bool("shareable")?,
        iotune: expand_iotune(&r.block("iotune")?)?,
        acl: r.json("acl")?,
        status: r.string("status")?,
        tech_status: r.string("tech_status")?,
        created_time: r.u64("created_time")?,
        deleted_time: r.u64("deleted_time")?,
        destruction_time: r.u64("destruction_time")?,
        purge_time: r.u64("purge_time")?,
        snapshots: r
            .blocks("snapshots")?
            .iter()
            .map(expand_snapshot)
            .collect::<Result<_, _>>()?,
    })
}

pub fn flatten_iotune(iotune: &IoTune) -> AttrMap {
    iotune
        .fields()
        .map(|(name, value)| (name.to_owned(), Value::from(value)))
        .collect()
}

pub fn expand_iotune(map: &AttrMap) -> Result<IoTune, CoreError> {
    let r = Reader::new(map, "iotune");
    let mut iotune = IoTune::default();
    for name in IoTune::FIELDS {
        iotune.set(name, r.i64(name)?);
    }
    Ok(iotune)
}

pub fn flatten_snapshot(snapshot: &Snapshot) -> AttrMap {
    object(json!({
        "label": snapshot.label,
        "guid": snapshot.guid,
        "res_id": snapshot.res_id,
        "snap_set_guid": snapshot.snap_set_guid,
        "snap_set_time": snapshot.snap_set_time,
        "timestamp": snapshot.timestamp,
    }))
}

pub fn expand_snapshot(map: &AttrMap) -> Result<Snapshot, CoreError> {
    let r = Reader::new(map, "snapshot");
    Ok(Snapshot {
        label: r.string("label")?,
        guid: r.string("guid")?,
        res_id: r.string("res_id")?,
        snap_set_guid: r.string("snap_set_guid")?,
        snap_set_time: r.u64("snap_set_time")?,
        timestamp: r.u64("timestamp")?,
    })
}
