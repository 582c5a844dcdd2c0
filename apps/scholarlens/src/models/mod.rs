pub mod essay;
pub mod persona;
pub mod resume;
pub mod scholarship;

use serde::{Deserialize, Deserializer};

/// Rejects scores outside `[0, 1]` (NaN included).
pub(crate) fn check_unit_interval(field: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} must be within [0, 1], got {value}"))
    }
}

/// The backend serializes missing values as `null` rather than omitting them.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
