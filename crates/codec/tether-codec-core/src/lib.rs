//! tether-codec-core: value serialization across the worker isolation boundary.
//!
//! A value is flattened into a byte buffer made of 4-byte headers (`tag << 24 | size`)
//! followed by optional payloads. The only native object allowed through is the shared
//! [`ListModelHandle`](tether_api_core::ListModelHandle), which travels in a side table
//! next to the bytes. Everything else that cannot be copied degrades to `Undefined`.

pub mod config;
mod de;
pub mod error;
mod ser;
pub mod tag;

pub use config::Limits;
pub use de::{deserialize, deserialize_with};
pub use error::CodecError;
pub use ser::{serialize, serialize_with, SerializedValue};
pub use tag::Tag;
