//! Delivery method expansion
//!
//! Users select one of three abstract delivery methods. "recovered" stands
//! for the four concrete recovery channels.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::constants::methods;
use crate::errors::SelectionError;

/// Delivery method a user may select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    Streamed,
    Telemetered,
    Recovered,
}

impl DeliveryMethod {
    /// Concrete methods recorded in the catalogs
    pub fn concrete(&self) -> &'static [&'static str] {
        match self {
            Self::Streamed => &["streamed"],
            Self::Telemetered => &["telemetered"],
            Self::Recovered => &methods::RECOVERED_FAN_OUT,
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streamed" => Ok(Self::Streamed),
            "telemetered" => Ok(Self::Telemetered),
            "recovered" => Ok(Self::Recovered),
            other => Err(SelectionError::InvalidSelectionValue {
                level: "delivery_method".to_string(),
                value: other.to_string(),
                available: methods::SELECTABLE.join(", "),
            }),
        }
    }
}

/// Every concrete method, used when no method is selected
pub fn default_methods() -> BTreeSet<String> {
    ["streamed", "telemetered"]
        .iter()
        .chain(methods::RECOVERED_FAN_OUT.iter())
        .chain(std::iter::once(&methods::NO_METHOD))
        .map(|m| m.to_string())
        .collect()
}

/// Expand selected delivery methods into the concrete methods to match
///
/// An empty selection yields the full default set.
///
/// # Errors
///
/// Returns `SelectionError::InvalidSelectionValue` for a token other than
/// streamed, telemetered or recovered.
pub fn define_methods<I, S>(selected: I) -> Result<BTreeSet<String>, SelectionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expanded = BTreeSet::new();
    let mut any = false;

    for token in selected {
        any = true;
        let method: DeliveryMethod = token.as_ref().parse()?;
        expanded.extend(method.concrete().iter().map(|m| m.to_string()));
    }

    if any {
        Ok(expanded)
    } else {
        Ok(default_methods())
    }
}
