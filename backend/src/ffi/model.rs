//! PyO3 wrapper for the simulation orchestrator

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::orchestrator::{ModelConfig, Orchestrator, TickResult};

fn runtime_error(context: &str, e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(format!("{}: {}", context, e))
}

fn parse_config(config_json: &str) -> PyResult<ModelConfig> {
    serde_json::from_str(config_json)
        .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid configuration: {}", e)))
}

fn tick_result_to_py(py: Python<'_>, result: &TickResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("tick", result.tick)?;
    dict.set_item("households", result.households)?;
    dict.set_item("houses", result.houses)?;
    dict.set_item("entered", result.entered)?;
    dict.set_item("exited", result.exited)?;
    dict.set_item("discouraged", result.discouraged)?;
    dict.set_item("evicted", result.evicted)?;
    dict.set_item("forced_sales", result.forced_sales)?;
    dict.set_item("offers", result.offers)?;
    dict.set_item("chains_rejected", result.chains_rejected)?;
    dict.set_item("sales", result.sales)?;
    dict.set_item("rentals", result.rentals)?;
    dict.set_item("constructed", result.constructed)?;
    dict.set_item("demolished", result.demolished)?;
    dict.set_item("rate_resets", result.rate_resets)?;
    Ok(dict.unbind())
}

/// Python handle on a running housing market simulation
///
/// # Example (from Python)
///
/// ```python
/// import json
/// from housing_simulator_core_rs import HousingModel
///
/// model = HousingModel(json.dumps({"grid_width": 20, "grid_height": 20}))
/// for result in model.run(12):
///     print(result["tick"], result["sales"], result["rentals"])
/// checkpoint = model.save_state()
/// ```
#[pyclass(name = "HousingModel")]
pub struct PyHousingModel {
    inner: Orchestrator,
}

#[pymethods]
impl PyHousingModel {
    /// Create and populate a city from a JSON configuration
    ///
    /// Missing fields take their defaults. Raises ValueError on malformed
    /// JSON and RuntimeError if validation or setup fails.
    #[new]
    fn new(config_json: &str) -> PyResult<Self> {
        let config = parse_config(config_json)?;
        let inner = Orchestrator::new(config).map_err(|e| runtime_error("Failed to create model", e))?;
        Ok(Self { inner })
    }

    /// Restore a model from a checkpoint written by `save_state`
    #[staticmethod]
    fn load_state(config_json: &str, state_json: &str) -> PyResult<Self> {
        let config = parse_config(config_json)?;
        let inner =
            Orchestrator::load_state(config, state_json).map_err(|e| runtime_error("Failed to load state", e))?;
        Ok(Self { inner })
    }

    /// Execute one tick and return its summary
    fn tick(&mut self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let result = self.inner.tick().map_err(|e| runtime_error("Tick execution failed", e))?;
        tick_result_to_py(py, &result)
    }

    /// Execute `ticks` ticks and return their summaries
    fn run(&mut self, py: Python<'_>, ticks: usize) -> PyResult<Vec<Py<PyDict>>> {
        let mut results = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            results.push(self.tick(py)?);
        }
        Ok(results)
    }

    fn current_tick(&self) -> usize {
        self.inner.current_tick()
    }

    fn interest_rate(&self) -> f64 {
        self.inner.interest_rate()
    }

    /// Change the prevailing annual rate (percent) from the next tick
    fn set_interest_rate(&mut self, annual_percent: f64) -> PyResult<()> {
        self.inner
            .set_interest_rate(annual_percent)
            .map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))
    }

    /// Monitors of the last tick as a JSON object string
    fn monitors(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.monitors()).map_err(|e| runtime_error("Failed to encode monitors", e))
    }

    fn num_households(&self) -> usize {
        self.inner.state().num_households()
    }

    fn num_houses(&self) -> usize {
        self.inner.state().num_houses()
    }

    /// Serialise the simulation to a JSON checkpoint
    fn save_state(&self) -> PyResult<String> {
        self.inner.save_state().map_err(|e| runtime_error("Failed to save state", e))
    }
}
