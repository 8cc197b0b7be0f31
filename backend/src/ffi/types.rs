//! Type conversions between Python and Rust
//!
//! Configs arrive as dicts, enum values as their wire names.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::models::task::{Channel, Stage, SubStage};
use crate::orchestrator::{DayResult, GameConfig};

/// Extract optional field with a default value
fn extract_with_default<'py, T>(dict: &Bound<'py, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

/// Parse a `GameConfig` from a Python dict; missing keys keep their defaults
pub fn parse_game_config(py_config: &Bound<'_, PyDict>) -> PyResult<GameConfig> {
    let defaults = GameConfig::default();

    Ok(GameConfig {
        rng_seed: extract_with_default(py_config, "rng_seed", defaults.rng_seed)?,
        initial_money: extract_with_default(py_config, "initial_money", defaults.initial_money)?,
        daily_overhead: extract_with_default(py_config, "daily_overhead", defaults.daily_overhead)?,
        penalty_per_day: extract_with_default(py_config, "penalty_per_day", defaults.penalty_per_day)?,
        revenue_on_acceptance: extract_with_default(
            py_config,
            "revenue_on_acceptance",
            defaults.revenue_on_acceptance,
        )?,
        revenue_on_done: extract_with_default(py_config, "revenue_on_done", defaults.revenue_on_done)?,
        curing_days: extract_with_default(py_config, "curing_days", defaults.curing_days)?,
        event_probability: extract_with_default(
            py_config,
            "event_probability",
            defaults.event_probability,
        )?,
        equipment_bonus: extract_with_default(py_config, "equipment_bonus", defaults.equipment_bonus)?,
        rain_reduction_pct: extract_with_default(
            py_config,
            "rain_reduction_pct",
            defaults.rain_reduction_pct,
        )?,
        design_error_unblock: extract_with_default(
            py_config,
            "design_error_unblock",
            defaults.design_error_unblock,
        )?,
        safety_unblock: extract_with_default(py_config, "safety_unblock", defaults.safety_unblock)?,
        urgent_visit_due_days: extract_with_default(
            py_config,
            "urgent_visit_due_days",
            defaults.urgent_visit_due_days,
        )?,
    })
}

pub fn parse_channel(name: &str) -> PyResult<Channel> {
    Channel::ALL
        .into_iter()
        .find(|c| c.as_str() == name)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown channel: {}", name)))
}

pub fn parse_stage(name: &str) -> PyResult<Stage> {
    Stage::ALL
        .into_iter()
        .find(|s| s.as_str() == name)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown stage: {}", name)))
}

pub fn parse_sub_stage(name: Option<&str>) -> PyResult<Option<SubStage>> {
    match name {
        None => Ok(None),
        Some("Doing") => Ok(Some(SubStage::Doing)),
        Some("Ready") => Ok(Some(SubStage::Ready)),
        Some(other) => Err(PyValueError::new_err(format!("Unknown sub-stage: {}", other))),
    }
}

/// Convert a `DayResult` to a Python dict
pub fn day_result_to_py(py: Python, result: &DayResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("day", result.day)?;
    dict.set_item("event", result.event.map(|e| e.as_str()))?;
    dict.set_item("promoted", result.promoted.clone())?;
    dict.set_item("started", result.started.clone())?;
    dict.set_item("advanced", result.advanced.clone())?;
    dict.set_item("curing_started", result.curing_started.clone())?;
    dict.set_item("completed", result.completed.clone())?;
    dict.set_item("released", result.released.clone())?;
    dict.set_item("revenue", result.revenue)?;
    dict.set_item("costs", result.costs)?;
    dict.set_item("money", result.money)?;
    dict.set_item("game_over", result.game_over)?;
    dict.set_item("game_won", result.game_won)?;

    Ok(dict.unbind())
}
