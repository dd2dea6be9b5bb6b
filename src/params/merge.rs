use tracing::debug;

use super::definition::ParamMap;
use super::values::{ValueMap, ValueSlot};
use crate::error::TdsHelperError;

/// Behaviour switches for [`merge_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Fail with `MissingRequiredParameter` when a required parameter is not found
    /// under any of its lookup keys. When off, the parameter is left without a value
    /// and attachment reports it instead.
    pub throw_on_missing: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            throw_on_missing: true,
        }
    }
}

/// Merge `values` into `defs` with the default options.
///
/// # Errors
/// Returns `TdsHelperError::MissingRequiredParameter` naming the first required
/// parameter (in name order) that has no key in `values`.
pub fn merge(defs: &ParamMap, values: &ValueMap) -> Result<ParamMap, TdsHelperError> {
    merge_with(defs, values, MergeOptions::default())
}

/// Merge `values` into a copy of `defs`.
///
/// For each parameter the first present lookup key wins; an undefined slot under that
/// key counts as found but assigns nothing. `defs` itself is left untouched.
///
/// # Errors
/// Returns `TdsHelperError::MissingRequiredParameter` when a required parameter has no
/// key in `values` and `options.throw_on_missing` is set.
pub fn merge_with(
    defs: &ParamMap,
    values: &ValueMap,
    options: MergeOptions,
) -> Result<ParamMap, TdsHelperError> {
    debug!(params = defs.len(), values = values.len(), "merge");
    let mut merged = defs.clone();

    for (name, def) in merged.iter_mut() {
        let found = def
            .lookup_keys(name)
            .iter()
            .find_map(|key| values.get(key));

        match found {
            Some(ValueSlot::Value(value)) => def.value = Some(value.clone()),
            Some(ValueSlot::Undefined) => {}
            None if def.required && options.throw_on_missing => {
                debug!(param = %name, "Missing required parameter");
                return Err(TdsHelperError::MissingRequiredParameter(name.clone()));
            }
            None => {}
        }
    }

    Ok(merged)
}
