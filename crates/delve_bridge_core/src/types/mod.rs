//! Serde mirrors of the engine's JSON-RPC v2 API.
//!
//! Field names follow the engine's wire format exactly; Go emits `null` for
//! empty slices, so list fields go through [`nullable`].

pub mod api;
pub mod requests;
pub mod responses;

pub use api::*;
pub use requests::*;
pub use responses::*;

use serde::{Deserialize, Deserializer};

pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
