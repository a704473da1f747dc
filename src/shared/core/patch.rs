use serde::{Deserialize, Deserializer};

/// Distinguishes an absent patch field from an explicit null. Wrap the field
/// in a double `Option` with `#[serde(default, deserialize_with = "clearable")]`:
/// absent deserializes to `None` (leave the stored value alone), `null` to
/// `Some(None)` (clear it), and a value to `Some(Some(v))`.
pub fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
