pub mod app;
pub mod audio;
pub mod camera3d;
pub mod canvas;
pub mod capture;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod events;
pub mod input;
pub mod mesh;
pub mod outline;
pub mod particles;
pub mod picking;
pub mod renderer;
pub mod scene;
pub mod simulation;
pub mod sky;
pub mod time;
pub mod weather;

pub use app::{run, run_with_overrides, App};
