//! Configuration change notification.
//!
//! Listeners register for a single key or for all keys; the sync engine
//! dispatches at most once per genuine value transition per refresh cycle.

pub mod listener;

pub use listener::{ListenerHandle, ListenerRegistry};
