//! Serialization of fitted parameters.
//!
//! Fitted scalers and classifiers expose their learned state as plain data
//! (`Vec<f64>`, scalars) and convert it to bytes through [`SerializableParams`].
//! Storage is somebody else's concern: bytes go to an
//! [`ArtifactStore`](crate::store::ArtifactStore).

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;

/// Upper bound on a decoded payload; guards against allocating from corrupt length prefixes.
const MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data (e.g., `Vec<f64>`, scalars).
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        codec().serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        codec().deserialize(bytes)
    }
}

/// Fixed-width little-endian encoding; identical parameters give identical bytes.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
        .with_limit(MAX_PAYLOAD_BYTES)
}
