use serde_json::json;

use super::{Reader, json_text, nested, object, records};
use crate::error::CoreError;
use crate::host::data::AttrMap;
use crate::model::{Backend, Binding, Frontend, LoadBalancer, Node, Server, ServerSettings};

pub fn flatten_load_balancer(lb: &LoadBalancer) -> AttrMap {
    object(json!({
        "lb_id": lb.id,
        "name": lb.name,
        "rg_id": lb.rg_id,
        "rg_name": lb.rg_name,
        "extnet_id": lb.extnet_id,
        "vins_id": lb.vins_id,
        "image_id": lb.image_id,
        "desc": lb.desc,
        "ha_mode": lb.ha_mode,
        "primary_node": nested(flatten_node(&lb.primary_node)),
        "secondary_node": nested(flatten_node(&lb.secondary_node)),
        "status": lb.status,
        "tech_status": lb.tech_status,
        "dp_api_user": lb.dp_api_user,
        "gid": lb.gid,
        "guid": lb.guid,
        "milestones": lb.milestones,
        "acl": json_text(&lb.acl),
        "created_by": lb.created_by,
        "created_time": lb.created_time,
        "updated_by": lb.updated_by,
        "updated_time": lb.updated_time,
        "deleted_by": lb.deleted_by,
        "deleted_time": lb.deleted_time,
        "backends": records(lb.backends.iter().map(flatten_backend)),
        "frontends": records(lb.frontends.iter().map(flatten_frontend)),
    }))
}

pub fn expand_load_balancer(map: &AttrMap) -> Result<LoadBalancer, CoreError> {
    let r = Reader::new(map, "lb");
    Ok(LoadBalancer {
        id: r.u64("lb_id")?,
        name: r.string("name")?,
        rg_id: r.u64("rg_id")?,
        rg_name: r.string("rg_name")?,
        extnet_id: r.u64("extnet_id")?,
        vins_id: r.u64("vins_id")?,
        image_id: r.u64("image_id")?,
        desc: r.string("desc")?,
        ha_mode: r.bool("ha_mode")?,
        primary_node: expand_node(&r.block("primary_node")?)?,
        secondary_node: expand_node(&r.block("secondary_node")?)?,
        status: r.string("status")?,
        tech_status: r.string("tech_status")?,
        dp_api_user: r.string("dp_api_user")?,
        gid: r.u64("gid")?,
        guid: r.u64("guid")?,
        milestones: r.u64("milestones")?,
        acl: r.json("acl")?,
        created_by: r.string("created_by")?,
        created_time: r.u64("created_time")?,
        updated_by: r.string("updated_by")?,
        updated_time: r.u64("updated_time")?,
        deleted_by: r.string("deleted_by")?,
        deleted_time: r.u64("deleted_time")?,
        backends: r
            .blocks("backends")?
            .iter()
            .map(expand_backend)
            .collect::<Result<_, _>>()?,
        frontends: r
            .blocks("frontends")?
            .iter()
            .map(expand_frontend)
            .collect::<Result<_, _>>()?,
    })
}

pub fn flatten_node(node: &Node) -> AttrMap {
    object(json!({
        "backend_ip": node.backend_ip,
        "compute_id": node.compute_id,
        "frontend_ip": node.frontend_ip,
        "guid": node.guid,
        "mgmt_ip": node.mgmt_ip,
        "network_id": node.network_id,
    }))
}

pub fn expand_node(map: &AttrMap) -> Result<Node, CoreError> {
    let r = Reader::new(map, "node");
    Ok(Node {
        backend_ip: r.string("backend_ip")?,
        compute_id: r.u64("compute_id")?,
        frontend_ip: r.string("frontend_ip")?,
        guid: r.string("guid")?,
        mgmt_ip: r.string("mgmt_ip")?,
        network_id: r.u64("network_id")?,
    })
}

pub fn flatten_backend(backend: &Backend) -> AttrMap {
    object(json!({
        "name": backend.name,
        "algorithm": backend.algorithm.to_string(),
        "guid": backend.guid,
        "server_default_settings": nested(flatten_server_settings(&backend.server_default_settings)),
        "servers": records(backend.servers.iter().map(flatten_server)),
    }))
}

pub fn expand_backend(map: &AttrMap) -> Result<Backend, CoreError> {
    let r = Reader::new(map, "backend");
    Ok(Backend {
        name: r.string("name")?,
        algorithm: r.parsed("algorithm")?,
        guid: r.string("guid")?,
        server_default_settings: expand_server_settings(&r.block("server_default_settings")?)?,
        servers: r
            .blocks("servers")?
            .iter()
            .map(expand_server)
            .collect::<Result<_, _>>()?,
    })
}

pub fn flatten_server_settings(settings: &ServerSettings) -> AttrMap {
    object(json!({
        "guid": settings.guid,
        "inter": settings.inter,
        "downinter": settings.downinter,
        "rise": settings.rise,
        "fall": settings.fall,
        "slowstart": settings.slowstart,
        "maxconn": settings.maxconn,
        "maxqueue": settings.maxqueue,
        "weight": settings.weight,
    }))
}

pub fn expand_server_settings(map: &AttrMap) -> Result<ServerSettings, CoreError> {
    let r = Reader::new(map, "server_settings");
    Ok(ServerSettings {
        guid: r.string("guid")?,
        inter: r.i64("inter")?,
        downinter: r.i64("downinter")?,
        rise: r.i64("rise")?,
        fall: r.i64("fall")?,
        slowstart: r.i64("slowstart")?,
        maxconn: r.i64("maxconn")?,
        maxqueue: r.i64("maxqueue")?,
        weight: r.i64("weight")?,
    })
}

pub fn flatten_server(server: &Server) -> AttrMap {
    object(json!({
        "name": server.name,
        "address": server.address,
        "port": server.port,
        "check": server.check.to_string(),
        "guid": server.guid,
        "server_settings": nested(flatten_server_settings(&server.server_settings)),
    }))
}

pub fn expand_server(map: &AttrMap) -> Result<Server, CoreError> {
    let r = Reader::new(map, "server");
    Ok(Server {
        name: r.string("name")?,
        address: r.string("address")?,
        port: r.u16("port")?,
        check: r.parsed("check")?,
        guid: r.string("guid")?,
        server_settings: expand_server_settings(&r.block("server_settings")?)?,
    })
}

pub fn flatten_frontend(frontend: &Frontend) -> AttrMap {
    object(json!({
        "name": frontend.name,
        "backend": frontend.backend,
        "guid": frontend.guid,
        "bindings": records(frontend.bindings.iter().map(flatten_binding)),
    }))
}

pub fn expand_frontend(map: &AttrMap) -> Result<Frontend, CoreError> {
    let r = Reader::new(map, "frontend");
    Ok(Frontend {
        name: r.string("name")?,
        backend: r.string("backend")?,
        guid: r.string("guid")?,
        bindings: r
            .blocks("bindings")?
            .iter()
            .map(expand_binding)
            .collect::<Result<_, _>>()?,
    })
}

pub fn flatten_binding(binding: &Binding) -> AttrMap {
    object(json!({
        "name": binding.name,
        "address": binding.address,
        "port": binding.port,
        "guid": binding.guid,
    }))
}

pub fn expand_binding(map: &AttrMap) -> Result<Binding, CoreError> {
    let r = Reader::new(map, "binding");
    Ok(Binding {
        name: r.string("name")?,
        address: r.string("address")?,
        port: r.u16("port")?,
        guid: r.string("guid")?,
    })
}
