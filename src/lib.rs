//! Keyboard Setup Library
//!
//! This library resolves the keyboard layout of a system from saved state,
//! probed hardware and the system language, derives the console and X11
//! settings from the keyboard database, applies them, and persists them to
//! sysconfig-style files on the target root.

// Module declarations
pub mod applier;
pub mod cli;
pub mod config;
pub mod constants;
pub mod doctor;
pub mod keyboard_db;
pub mod models;
pub mod persistence;
pub mod resolver;
pub mod services;
pub mod session;
pub mod state;
