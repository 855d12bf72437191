//! External data sources: the remote admin source and the disk mirror.

mod mirror;
mod remote;

pub use mirror::MirrorStore;
pub use remote::{HttpRemoteSource, HttpRemoteSourceBuilder, RemoteSource};
