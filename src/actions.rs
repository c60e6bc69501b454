//! The mergepoint action vocabulary
//!
//! A template body is composed of five primitive actions. The set is
//! closed, so it is a plain enum rather than a trait; outlets stay an
//! open trait because template authors supply their own.
//!
//! Every string parameter goes through `${...}` token replacement once
//! per execution before it is used. The `accept_not_set`/`accept_empty`
//! flags (default true) decide whether an absent match or option is
//! tolerated as an empty fragment or fatal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::ControllerState;
use crate::error::GeneratorError;
use crate::options::replace_tokens;
use crate::outlet::{invoke, OutletResult};
use crate::path::{get_element, iterate_pointer};

fn default_true() -> bool {
    true
}

/// A primitive operation at an insertion point in a template body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergepointAction {
    /// Emit a literal string, after token replacement
    Output {
        /// The literal to emit
        value: String,
    },

    /// Emit the value of an option
    OptionValue {
        /// Qualified option key
        option: String,
        /// Tolerate an unset option as an empty fragment
        #[serde(default = "default_true")]
        accept_not_set: bool,
    },

    /// Emit an attribute of an element resolved by path
    SourceAttribute {
        /// Path expression resolving to at most one element
        element: String,
        /// Attribute key to read
        attribute: String,
        /// Tolerate a missing element or attribute as an empty fragment
        #[serde(default = "default_true")]
        accept_not_set: bool,
    },

    /// Invoke an outlet against at most one element resolved by path
    Apply {
        /// Path expression resolving to at most one element
        path: String,
        /// Qualified outlet name to invoke
        outlet: String,
        /// Tolerate zero matches as an empty fragment; more than one
        /// match is fatal regardless of this flag
        #[serde(default = "default_true")]
        accept_not_set: bool,
    },

    /// Invoke an outlet against every element resolved by path, in
    /// document order, concatenating the fragments
    TraverseAll {
        /// Path expression selecting the elements to traverse
        path: String,
        /// Qualified outlet name to invoke per element
        outlet: String,
        /// Tolerate an empty selection as an empty fragment
        #[serde(default = "default_true")]
        accept_empty: bool,
    },
}

impl MergepointAction {
    /// Execute the action against the current controller state
    pub fn execute(
        &self,
        state: &mut ControllerState<'_>,
    ) -> Result<OutletResult, GeneratorError> {
        match self {
            MergepointAction::Output { value } => {
                let text = replace_tokens(value, state.options())?;
                Ok(OutletResult::Text(text))
            }

            MergepointAction::OptionValue {
                option,
                accept_not_set,
            } => {
                let key = replace_tokens(option, state.options())?;
                match state.get_option(&key) {
                    Some(value) => Ok(OutletResult::Text(value.to_string())),
                    None if *accept_not_set => Ok(OutletResult::empty()),
                    None => Err(GeneratorError::OptionNotSet(key)),
                }
            }

            MergepointAction::SourceAttribute {
                element,
                attribute,
                accept_not_set,
            } => {
                let expr = replace_tokens(element, state.options())?;
                let key = replace_tokens(attribute, state.options())?;
                let found = get_element(
                    state.model_root(),
                    state.current_path(),
                    state.current_node(),
                    &expr,
                    *accept_not_set,
                )?;

                let Some(resolved) = found else {
                    return Ok(OutletResult::empty());
                };
                match resolved.element.attribute(&key) {
                    Some(value) => Ok(OutletResult::Text(value.to_string())),
                    None if *accept_not_set => Ok(OutletResult::empty()),
                    None => Err(GeneratorError::AttributeNotSet {
                        path: resolved.path,
                        attribute: key,
                    }),
                }
            }

            MergepointAction::Apply {
                path,
                outlet,
                accept_not_set,
            } => {
                let expr = replace_tokens(path, state.options())?;
                let name = replace_tokens(outlet, state.options())?;
                // Unknown outlet is a configuration error even when the
                // path happens not to match.
                let outlet = state.registry().get(&name)?;

                // get_element makes >1 match fatal independent of the flag.
                let found = get_element(
                    state.model_root(),
                    state.current_path(),
                    state.current_node(),
                    &expr,
                    *accept_not_set,
                )?;

                match found {
                    Some(resolved) => {
                        debug!(outlet = %name, path = %resolved.path, "apply");
                        state.with_position(resolved.element, resolved.path, |nested| {
                            invoke(outlet, nested)
                        })
                    }
                    None => Ok(OutletResult::empty()),
                }
            }

            MergepointAction::TraverseAll {
                path,
                outlet,
                accept_empty,
            } => {
                let expr = replace_tokens(path, state.options())?;
                let name = replace_tokens(outlet, state.options())?;
                // Fail fast on a missing outlet, before any iteration,
                // so no partial output is produced.
                let outlet = state.registry().get(&name)?;

                let matches: Vec<_> = iterate_pointer(
                    state.model_root(),
                    state.current_path(),
                    state.current_node(),
                    &expr,
                )?
                .collect();

                if matches.is_empty() {
                    return if *accept_empty {
                        Ok(OutletResult::empty())
                    } else {
                        Err(GeneratorError::NoMatch(expr))
                    };
                }

                debug!(outlet = %name, path = %expr, count = matches.len(), "traverse");
                let mut out = OutletResult::empty();
                for resolved in matches {
                    let fragment = state
                        .with_position(resolved.element, resolved.path, |nested| {
                            invoke(outlet, nested)
                        })?;
                    out.append(fragment)?;
                }
                Ok(out)
            }
        }
    }
}
