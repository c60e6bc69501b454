#![warn(missing_docs)]

//! Template-driven source generation engine
//!
//! Walks an in-memory source tree under the control of named templates
//! ("outlets") whose bodies are composed of a small, closed set of
//! mergepoint actions, and reconciles the generated artifacts with
//! whatever already exists at the target path. The merge strategy keeps a
//! snapshot of each run's raw output so a later regeneration can fold in
//! both hand edits and template changes with a three-way line merge.

pub mod actions;
pub mod controller;
pub mod error;
pub mod merge;
pub mod options;
pub mod outlet;
pub mod path;
pub mod source_model;
pub mod strategy;
pub mod unit;

// Re-export public API
pub use actions::MergepointAction;
pub use controller::ControllerState;
pub use error::GeneratorError;
pub use merge::{merge_three_way, MergeOutcome};
pub use options::{replace_tokens, OptionStore};
pub use outlet::{invoke, Outlet, OutletRegistry, OutletResult, TemplateOutlet};
pub use path::{get_element, iterate_pointer, PathExpr, PointerIter};
pub use source_model::{ResolvedPath, SourceElement};
pub use strategy::{
    AppendStrategy, ExistingTargetStrategy, MergeStrategy, ReplaceStrategy, SkipStrategy,
    StrategyKind, UnitConfig,
};
pub use unit::Generator;
