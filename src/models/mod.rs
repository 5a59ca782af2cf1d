//! Data models for keyboard layouts, hardware facts, and session settings.
//!
//! This module contains the plain data structures shared by the database,
//! the resolver, the configuration state and the persistence layer.
//! Models carry no I/O and no decision logic.

pub mod context;
pub mod expert;
pub mod hardware;
pub mod layout_record;
pub mod profile;
pub mod x11;

// Re-export all model types
pub use context::{Mode, RemoteAccess, SessionContext, Stage};
pub use expert::{ExpertSettings, ExpertSettingsPatch};
pub use hardware::{DeviceAttribute, ProbedKeyboard};
pub use layout_record::{LayoutRecord, ModelEntry};
pub use profile::KeyboardProfile;
pub use x11::X11Parameters;
