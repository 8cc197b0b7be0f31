//! Python bindings (feature `pyo3`)

pub mod game;
pub mod types;
