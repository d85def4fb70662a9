//! # quadcopter - scene-graph quadcopter plugin
//!
//! Finds a quadcopter's parts inside a host scene by their custom data tags
//! and flies it toward a target object with a PID controller. Provides:
//! - A decoder for the custom data TLV blocks attached to scene objects
//! - Breadth-first discovery of body, target, cameras, and four motors
//! - Per-tick PID control writing motor particle velocities to motor scripts
//! - C FFI for hosting inside a C/C++ simulator plugin
//!
//! ## Quick Start
//! ```no_run
//! use quadcopter::{Config, MemoryScene, ObjectHandle, Quadcopter};
//!
//! let scene = MemoryScene::new();
//! let root = ObjectHandle(10);
//! if Quadcopter::query(&scene, root) {
//!     let mut quad = Quadcopter::new(&scene, root, Config::from_env()).unwrap();
//!     quad.simulation_started();
//!     quad.simulation_stepped(&scene);
//! }
//! ```

pub mod error;
pub mod types;
pub mod custom_data;
pub mod scene;
pub mod search;
pub mod config;
pub mod control;
pub mod motor;
pub mod snapshot;
pub mod quadcopter;
pub mod memory;
pub mod ffi;

pub use error::QuadcopterError;
pub use types::*;
pub use scene::Scene;
pub use config::{Config, Gains, MotorLayout, SnapshotConfig};
pub use quadcopter::Quadcopter;
pub use memory::MemoryScene;

/// Result type alias for quadcopter operations.
pub type Result<T> = std::result::Result<T, QuadcopterError>;
