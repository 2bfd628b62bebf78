//! Collaborator implementations
//!
//! Concrete process registries, parameter stores and notifiers the tracker
//! can be wired with.

pub mod notify;
pub mod params;
pub mod process;

pub use notify::ChannelNotifier;
pub use params::{JsonFileParamStore, MemoryParamStore};
#[cfg(feature = "sysinfo")]
pub use process::SysinfoProcessRegistry;
pub use process::StaticProcessRegistry;
