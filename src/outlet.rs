//! Outlets: named template procedures and their invocation protocol
//!
//! An outlet is an opaque named procedure with a three-phase lifecycle:
//! `before_execute`, `execute`, `after_execute`. Callers always go through
//! [`invoke`], which guarantees `after_execute` runs even when `execute`
//! fails, and the engine's Apply/TraverseAll actions additionally wrap the
//! invocation in the controller's position save/restore.

use std::collections::HashMap;

use tracing::debug;

use crate::actions::MergepointAction;
use crate::controller::ControllerState;
use crate::error::GeneratorError;

/// The fragment produced by one outlet or action execution
///
/// Either text or raw bytes, never both. Fragments are consumed
/// immediately by the caller and concatenated bottom-up into the final
/// per-target artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutletResult {
    /// A text fragment
    Text(String),
    /// An opaque byte fragment
    Binary(Vec<u8>),
}

impl OutletResult {
    /// The empty text fragment, the identity for concatenation
    pub fn empty() -> Self {
        OutletResult::Text(String::new())
    }

    /// Whether this is the empty text fragment
    pub fn is_empty_text(&self) -> bool {
        matches!(self, OutletResult::Text(text) if text.is_empty())
    }

    /// Append another fragment to this one
    ///
    /// Text concatenates with text and the empty text fragment is the
    /// identity for either kind. Any other combination, including two
    /// non-empty byte fragments, is an error.
    pub fn append(&mut self, other: OutletResult) -> Result<(), GeneratorError> {
        if other.is_empty_text() {
            return Ok(());
        }
        if self.is_empty_text() {
            *self = other;
            return Ok(());
        }
        match (&mut *self, other) {
            (OutletResult::Text(text), OutletResult::Text(more)) => {
                text.push_str(&more);
                Ok(())
            }
            (OutletResult::Text(_), OutletResult::Binary(_)) => {
                Err(GeneratorError::ResultKindMismatch(
                    "cannot append a byte result to a text result".to_string(),
                ))
            }
            (OutletResult::Binary(_), other) => Err(GeneratorError::ResultKindMismatch(format!(
                "cannot append a {} result to a byte result",
                match other {
                    OutletResult::Text(_) => "text",
                    OutletResult::Binary(_) => "byte",
                }
            ))),
        }
    }
}

/// A named, reusable template procedure
pub trait Outlet {
    /// Setup hook, run before the body
    fn before_execute(&self, _state: &mut ControllerState<'_>) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// The body: produce this outlet's fragment
    fn execute(&self, state: &mut ControllerState<'_>) -> Result<OutletResult, GeneratorError>;

    /// Teardown hook, run after the body on every exit path
    fn after_execute(&self, _state: &mut ControllerState<'_>) -> Result<(), GeneratorError> {
        Ok(())
    }
}

/// Run an outlet through its full lifecycle
///
/// `after_execute` runs even when `execute` fails; a failure from
/// `execute` still propagates afterwards, taking precedence over any
/// failure from `after_execute`.
pub fn invoke(
    outlet: &dyn Outlet,
    state: &mut ControllerState<'_>,
) -> Result<OutletResult, GeneratorError> {
    outlet.before_execute(state)?;
    let body = outlet.execute(state);
    let after = outlet.after_execute(state);
    let result = body?;
    after?;
    Ok(result)
}

/// Registry mapping namespace-qualified names to outlets
#[derive(Default)]
pub struct OutletRegistry {
    outlets: HashMap<String, Box<dyn Outlet>>,
}

impl OutletRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outlet under a qualified name
    pub fn register(&mut self, name: impl Into<String>, outlet: Box<dyn Outlet>) {
        let name = name.into();
        debug!(outlet = %name, "registering outlet");
        self.outlets.insert(name, outlet);
    }

    /// Resolve an outlet; an unknown name is always a fatal error
    pub fn get(&self, name: &str) -> Result<&dyn Outlet, GeneratorError> {
        self.outlets
            .get(name)
            .map(|outlet| &**outlet)
            .ok_or_else(|| GeneratorError::OutletNotFound(name.to_string()))
    }
}

/// An outlet whose body is an ordered list of mergepoint actions
///
/// Each action's fragment is appended in order; this is the standard
/// concrete outlet a template author composes.
pub struct TemplateOutlet {
    actions: Vec<MergepointAction>,
}

impl TemplateOutlet {
    /// Create an outlet from an action list
    pub fn new(actions: Vec<MergepointAction>) -> Self {
        Self { actions }
    }
}

impl Outlet for TemplateOutlet {
    fn execute(&self, state: &mut ControllerState<'_>) -> Result<OutletResult, GeneratorError> {
        let mut out = OutletResult::empty();
        for action in &self.actions {
            out.append(action.execute(state)?)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionStore;
    use crate::source_model::SourceElement;
    use std::cell::RefCell;

    struct RecordingOutlet {
        log: RefCell<Vec<&'static str>>,
        fail_execute: bool,
    }

    impl RecordingOutlet {
        fn new(fail_execute: bool) -> Self {
            Self {
                log: RefCell::new(Vec::new()),
                fail_execute,
            }
        }
    }

    impl Outlet for RecordingOutlet {
        fn before_execute(&self, _state: &mut ControllerState<'_>) -> Result<(), GeneratorError> {
            self.log.borrow_mut().push("before");
            Ok(())
        }

        fn execute(
            &self,
            _state: &mut ControllerState<'_>,
        ) -> Result<OutletResult, GeneratorError> {
            self.log.borrow_mut().push("execute");
            if self.fail_execute {
                Err(GeneratorError::NoMatch("body failed".to_string()))
            } else {
                Ok(OutletResult::Text("body".to_string()))
            }
        }

        fn after_execute(&self, _state: &mut ControllerState<'_>) -> Result<(), GeneratorError> {
            self.log.borrow_mut().push("after");
            Ok(())
        }
    }

    fn run_with_state<T>(body: impl FnOnce(&mut ControllerState<'_>) -> T) -> T {
        let root = SourceElement::new("root");
        let options = OptionStore::new();
        let registry = OutletRegistry::new();
        let mut state = ControllerState::new(&root, &options, &registry);
        body(&mut state)
    }

    #[test]
    fn test_invoke_runs_all_three_phases_in_order() {
        let outlet = RecordingOutlet::new(false);
        let result = run_with_state(|state| invoke(&outlet, state)).unwrap();
        assert_eq!(result, OutletResult::Text("body".to_string()));
        assert_eq!(*outlet.log.borrow(), vec!["before", "execute", "after"]);
    }

    #[test]
    fn test_after_execute_runs_when_execute_fails() {
        let outlet = RecordingOutlet::new(true);
        let result = run_with_state(|state| invoke(&outlet, state));
        assert!(matches!(result, Err(GeneratorError::NoMatch(_))));
        assert_eq!(*outlet.log.borrow(), vec!["before", "execute", "after"]);
    }

    #[test]
    fn test_registry_resolution_failure_is_fatal() {
        let registry = OutletRegistry::new();
        match registry.get("classes.peer") {
            Err(GeneratorError::OutletNotFound(name)) => assert_eq!(name, "classes.peer"),
            Err(other) => panic!("expected OutletNotFound, got {other:?}"),
            Ok(_) => panic!("expected OutletNotFound, got an outlet"),
        }
    }

    #[test]
    fn test_result_append_text() {
        let mut out = OutletResult::empty();
        out.append(OutletResult::Text("a".to_string())).unwrap();
        out.append(OutletResult::Text("b".to_string())).unwrap();
        assert_eq!(out, OutletResult::Text("ab".to_string()));
    }

    #[test]
    fn test_result_append_empty_text_is_identity_for_binary() {
        let mut out = OutletResult::Binary(vec![1, 2]);
        out.append(OutletResult::empty()).unwrap();
        assert_eq!(out, OutletResult::Binary(vec![1, 2]));

        let mut out = OutletResult::empty();
        out.append(OutletResult::Binary(vec![3])).unwrap();
        assert_eq!(out, OutletResult::Binary(vec![3]));
    }

    #[test]
    fn test_result_append_mixed_kinds_fails() {
        let mut out = OutletResult::Text("a".to_string());
        assert!(out.append(OutletResult::Binary(vec![1])).is_err());

        let mut out = OutletResult::Binary(vec![1]);
        assert!(out.append(OutletResult::Binary(vec![2])).is_err());
        assert!(out.append(OutletResult::Text("b".to_string())).is_err());
    }
}
