pub mod app;
pub mod compose;
pub mod config;
pub mod jiggle;
pub mod layout;
pub mod matching;
pub mod morph;
pub mod paths;
pub mod render;
pub mod scheduler;
pub mod solver;
pub mod state;
pub mod stats;
