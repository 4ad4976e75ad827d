// Platform API paths, relative to `{controller_url}/restmachine`.

pub mod lb {
    pub const CREATE: &str = "/cloudapi/lb/create";
    pub const GET: &str = "/cloudapi/lb/get";
    pub const DELETE: &str = "/cloudapi/lb/delete";
    pub const ENABLE: &str = "/cloudapi/lb/enable";
    pub const DISABLE: &str = "/cloudapi/lb/disable";
    pub const START: &str = "/cloudapi/lb/start";
    pub const STOP: &str = "/cloudapi/lb/stop";
    pub const UPDATE: &str = "/cloudapi/lb/update";
    pub const RESTART: &str = "/cloudapi/lb/restart";
    pub const RESTORE: &str = "/cloudapi/lb/restore";
    pub const CONFIG_RESET: &str = "/cloudapi/lb/configReset";

    pub const BACKEND_CREATE: &str = "/cloudapi/lb/backendCreate";
    pub const BACKEND_DELETE: &str = "/cloudapi/lb/backendDelete";
    pub const BACKEND_UPDATE: &str = "/cloudapi/lb/backendUpdate";
    pub const SERVER_ADD: &str = "/cloudapi/lb/backendServerAdd";
    pub const SERVER_DELETE: &str = "/cloudapi/lb/backendServerDelete";
    pub const SERVER_UPDATE: &str = "/cloudapi/lb/backendServerUpdate";
    pub const FRONTEND_CREATE: &str = "/cloudapi/lb/frontendCreate";
    pub const FRONTEND_DELETE: &str = "/cloudapi/lb/frontendDelete";
    pub const BIND: &str = "/cloudapi/lb/frontendBind";
    pub const BIND_DELETE: &str = "/cloudapi/lb/frontendBindDelete";
    pub const BIND_UPDATE: &str = "/cloudapi/lb/frontendBindingUpdate";
}

pub mod disks {
    pub const CREATE: &str = "/cloudapi/disks/create";
    pub const GET: &str = "/cloudapi/disks/get";
    pub const DELETE: &str = "/cloudapi/disks/delete";
    pub const RESTORE: &str = "/cloudapi/disks/restore";
    pub const RESIZE: &str = "/cloudapi/disks/resize2";
    pub const RENAME: &str = "/cloudapi/disks/rename";
    pub const LIMIT_IO: &str = "/cloudapi/disks/limitIO";
    pub const SHARE: &str = "/cloudapi/disks/share";
    pub const UNSHARE: &str = "/cloudapi/disks/unshare";
    pub const SNAPSHOT_ROLLBACK: &str = "/cloudapi/disks/snapshotRollback";
    pub const SNAPSHOT_DELETE: &str = "/cloudapi/disks/snapshotDelete";
}
