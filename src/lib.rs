//! Loading, shape validation and preprocessing for the reactive-flow and
//! synthetic clustering fixtures.
//!
//! The `reactive_flow/` folder holds the flameD thermochemical state
//! (temperature plus species), its column labels, the mesh and the fluid
//! variables; `dummy_data/` holds small 2-D blobs, moons and circles.

pub mod config;
pub mod data;
pub mod error;
pub mod kernel;
pub mod linalg;
pub mod preprocess;
pub mod rng;
pub mod synthetic;
pub mod validate;

pub use error::{FlowDataError, Result};
