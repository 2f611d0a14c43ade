//! Bulk decoding: a whole document parsed and laid over the destination.
//!
//! The destination is serialized to a [`Value`] tree, the parsed document is
//! deep-merged on top of it, and the result is deserialized back. Keys the
//! document does not mention keep whatever the destination already held.
//! Document keys are matched against the destination's serde field names
//! as-is.
//!
//! Fields marked `#[serde(skip)]` do not take part in the round trip: every
//! bulk step resets them to their `Default`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, ParseError};
use crate::merge::deep_merge;
use crate::value::{self, Value};

/// Parses bytes of some structured format into a [`Value`] tree.
pub trait Unmarshaller {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, ParseError>;
}

impl<F> Unmarshaller for F
where
    F: Fn(&[u8]) -> Result<Value, ParseError>,
{
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, ParseError> {
        self(bytes)
    }
}

/// Parse `bytes` with `unmarshaller` and lay the result over `dst`.
pub fn unmarshal_into<T>(
    unmarshaller: &dyn Unmarshaller,
    bytes: &[u8],
    dst: &mut T,
) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned,
{
    let overlay = unmarshaller
        .unmarshal(bytes)
        .map_err(|source| Error::Parse {
            origin: "input".to_string(),
            source,
        })?;
    merge_into(overlay, dst)
}

/// Lay an already parsed tree over `dst`. `Null` changes nothing.
///
/// On failure `dst` is left as it was. `#[serde(skip)]` fields come back as
/// their `Default`, since `dst` is rebuilt by deserialization.
pub fn merge_into<T>(overlay: Value, dst: &mut T) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned,
{
    if overlay.is_null() {
        return Ok(());
    }
    let base = value::to_value(&*dst)?;
    *dst = value::from_value(deep_merge(base, overlay))?;
    Ok(())
}
