// ── Platform domain types ──

pub mod disk;
pub mod lb;
pub mod status;

pub use disk::{Disk, DiskType, IoTune, Snapshot, UNLIMITED};
pub use lb::{Algorithm, Backend, Binding, Check, Frontend, LoadBalancer, Node, Server, ServerSettings};
pub use status::Status;
