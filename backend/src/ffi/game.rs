//! PyO3 wrapper for the game engine

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{day_result_to_py, parse_channel, parse_game_config, parse_stage, parse_sub_stage};
use crate::orchestrator::GameEngine;

/// Python wrapper for the Rust game engine
///
/// # Example (from Python)
///
/// ```python
/// from kanban_sim_core_rs import Game
///
/// game = Game({"rng_seed": 7})
/// result = game.next_day()
/// game.auto_distribute_capacity()
/// print(result["day"], result["money"])
/// ```
#[pyclass(name = "Game")]
pub struct PyGame {
    inner: GameEngine,
}

#[pymethods]
impl PyGame {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => parse_game_config(dict)?,
            None => Default::default(),
        };

        let inner = GameEngine::new(config)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to create game: {}", e)))?;

        Ok(PyGame { inner })
    }

    /// Advance one day; `None` once the game is over or won
    fn next_day(&mut self, py: Python) -> PyResult<Option<Py<PyDict>>> {
        self.inner
            .next_day()
            .map(|result| day_result_to_py(py, &result))
            .transpose()
    }

    fn spend_capacity(&mut self, task_id: &str, channel: &str, amount: u32) -> PyResult<bool> {
        Ok(self.inner.spend_capacity(task_id, parse_channel(channel)?, amount))
    }

    #[pyo3(signature = (task_id, stage, sub_stage=None))]
    fn move_task(&mut self, task_id: &str, stage: &str, sub_stage: Option<&str>) -> PyResult<()> {
        self.inner
            .move_task(task_id, parse_stage(stage)?, parse_sub_stage(sub_stage)?);
        Ok(())
    }

    /// Returns the number of spends applied
    fn auto_distribute_capacity(&mut self) -> usize {
        self.inner.auto_distribute_capacity().len()
    }

    fn unblock_task(&mut self, task_id: &str, channel: &str, amount: u32) -> PyResult<bool> {
        Ok(self.inner.unblock_task(task_id, parse_channel(channel)?, amount))
    }

    fn convert_capacity(&mut self, from: &str, to: &str, amount: u32) -> PyResult<bool> {
        Ok(self
            .inner
            .convert_capacity(parse_channel(from)?, parse_channel(to)?, amount))
    }

    fn new_game(&mut self) -> PyResult<()> {
        self.inner
            .new_game()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to start a new game: {}", e)))
    }

    fn clear_history(&mut self) {
        self.inner.clear_history();
    }

    /// Full game state as JSON
    fn state_json(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.state())
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize state: {}", e)))
    }

    fn day(&self) -> u32 {
        self.inner.state().day()
    }

    fn money(&self) -> i64 {
        self.inner.state().money()
    }

    fn profit(&self) -> i64 {
        self.inner.profit()
    }
}
