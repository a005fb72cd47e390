//! Terminal time tracker. Start and stop work sessions, browse them, chart where the hours went
//! and keep notes and goals next to them. Everything is stored locally in the state directory.

pub mod analytics;
pub mod cli;
pub mod notes;
pub mod storage;
pub mod tracker;
pub mod utils;
