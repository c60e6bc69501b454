//! Mutable execution context threaded through a generation run
//!
//! The controller state is the only mutable structure a run shares. It is
//! single-owner and single-threaded for the whole run; the save/restore
//! discipline around recursive outlet invocation is the only
//! synchronization it needs. Outlet nesting uses plain recursion, so the
//! call depth is bounded by template nesting depth.

use tracing::trace;

use crate::error::GeneratorError;
use crate::options::OptionStore;
use crate::outlet::OutletRegistry;
use crate::source_model::SourceElement;

/// Execution context for one generation unit
///
/// Invariant: `current_path`, re-resolved from the model root, always
/// yields `current_node`. [`ControllerState::with_position`] is the only
/// way to move the position, and it restores both fields on every exit
/// path, so the invariant holds across recursive outlet invocation.
pub struct ControllerState<'a> {
    model_root: &'a SourceElement,
    current_node: &'a SourceElement,
    current_path: String,
    options: &'a OptionStore,
    registry: &'a OutletRegistry,
}

impl<'a> ControllerState<'a> {
    /// Create a state positioned at the model root (path `"."`)
    pub fn new(
        model_root: &'a SourceElement,
        options: &'a OptionStore,
        registry: &'a OutletRegistry,
    ) -> Self {
        Self {
            model_root,
            current_node: model_root,
            current_path: ".".to_string(),
            options,
            registry,
        }
    }

    /// The source model root, constant for the run
    pub fn model_root(&self) -> &'a SourceElement {
        self.model_root
    }

    /// The element the run is currently positioned at
    pub fn current_node(&self) -> &'a SourceElement {
        self.current_node
    }

    /// Fully qualified path of the current element
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// The active option resolver
    pub fn options(&self) -> &'a OptionStore {
        self.options
    }

    /// The active outlet registry
    pub fn registry(&self) -> &'a OutletRegistry {
        self.registry
    }

    /// Resolve an option through the active resolver
    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.options.get_option(key)
    }

    /// Run `body` with the position swapped to `node`/`path`
    ///
    /// Saves the current position, installs the new one, and restores the
    /// saved position unconditionally before returning, whether `body`
    /// succeeded or failed.
    pub fn with_position<T>(
        &mut self,
        node: &'a SourceElement,
        path: String,
        body: impl FnOnce(&mut Self) -> Result<T, GeneratorError>,
    ) -> Result<T, GeneratorError> {
        trace!(from = %self.current_path, to = %path, "descending");
        let saved_node = std::mem::replace(&mut self.current_node, node);
        let saved_path = std::mem::replace(&mut self.current_path, path);

        let result = body(self);

        self.current_node = saved_node;
        self.current_path = saved_path;
        result
    }
}
