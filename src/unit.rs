//! Driver for one generation unit
//!
//! A unit binds a source model, an option store, an outlet registry, a
//! reconciliation strategy and output settings, and generates one target
//! at a time: strategy gate, root outlet execution, strategy commit.
//! Execution is synchronous and single-threaded for the whole unit.

use std::path::Path;

use tracing::{debug, info};

use crate::controller::ControllerState;
use crate::error::GeneratorError;
use crate::options::OptionStore;
use crate::outlet::{invoke, OutletRegistry};
use crate::source_model::SourceElement;
use crate::strategy::{ExistingTargetStrategy, UnitConfig};

/// Runs root outlets against a source model and commits the results
pub struct Generator<'a> {
    model_root: &'a SourceElement,
    options: &'a OptionStore,
    registry: &'a OutletRegistry,
    strategy: Box<dyn ExistingTargetStrategy>,
    unit: UnitConfig,
}

impl<'a> Generator<'a> {
    /// Create a generator for one unit
    pub fn new(
        model_root: &'a SourceElement,
        options: &'a OptionStore,
        registry: &'a OutletRegistry,
        strategy: Box<dyn ExistingTargetStrategy>,
        unit: UnitConfig,
    ) -> Self {
        Self {
            model_root,
            options,
            registry,
            strategy,
            unit,
        }
    }

    /// The unit settings this generator commits under
    pub fn unit(&self) -> &UnitConfig {
        &self.unit
    }

    /// Generate one target file
    ///
    /// Runs the named root outlet against the model root and hands the
    /// resulting fragment to the reconciliation strategy. Returns whether
    /// the target was generated (`false` when the strategy declined).
    /// Errors abort this target only; previously committed targets stay
    /// as written.
    pub fn generate(
        &self,
        root_outlet: &str,
        output_key: Option<&str>,
        output_path: &Path,
    ) -> Result<bool, GeneratorError> {
        if !self
            .strategy
            .before_generation(output_key, output_path, &self.unit)?
        {
            debug!(
                target = %output_path.display(),
                strategy = self.strategy.name(),
                "strategy declined generation"
            );
            return Ok(false);
        }

        let outlet = self.registry.get(root_outlet)?;
        let mut state = ControllerState::new(self.model_root, self.options, self.registry);
        let result = invoke(outlet, &mut state)?;

        self.strategy
            .after_generation(output_key, output_path, &result, &self.unit)?;
        info!(
            target = %output_path.display(),
            outlet = root_outlet,
            strategy = self.strategy.name(),
            "generated target"
        );
        Ok(true)
    }
}
