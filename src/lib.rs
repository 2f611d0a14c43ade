//! Layered configuration loading for Rust applications. Start from defaults,
//! list your sources, and run the flow.
//!
//! A [`Flow`] holds one configuration value and an ordered list of decoding
//! steps. Each step updates the value in place: keys it has data for are
//! overwritten, everything else is left alone. Later steps therefore override
//! earlier ones.
//!
//! ```ignore
//! let config = Flow::builder(AppConfig::default())
//!     .optional_file("/etc/myapp/config.yaml")
//!     .optional_file("myapp.json")
//!     .env_prefix("MYAPP")
//!     .load()?;
//! ```
//!
//! # Two kinds of sources
//!
//! **Bulk sources** parse a whole document (JSON, YAML, TOML, or anything
//! implementing [`Unmarshaller`]) and lay it over the destination. Keys are
//! the destination's serde field names; nested tables map to nested structs.
//! See [`FileDecoder`] and [`BytesDecoder`].
//!
//! **Key-value sources** answer one key at a time. Environment variables are
//! the typical case: there is no document to parse, only names to look up.
//! The crate derives the names from the destination's fields through the
//! field mapper, then asks the source for each one. See [`KvSource`],
//! [`EnvSource`] and [`StructSource`].
//!
//! # Records and the field mapper
//!
//! Key-value sources need to know which keys a destination has. A destination
//! type describes its fields by implementing [`Record`], usually through the
//! [`record!`] macro:
//!
//! ```ignore
//! configflow::record! {
//!     AppConfig {
//!         leaf host as "Host",
//!         leaf port as "Port" [env = "LISTEN_PORT"],
//!         nested database: Database as "Database",
//!     }
//! }
//! ```
//!
//! The [`Mapper`] turns that description into canonical keys under a
//! [`MapperOptions`] policy: an optional tag whose values replace declared
//! names, a [`NameTransform`] for untagged names, and a [`KeyReducer`] that
//! joins parent and child names. The environment policy is tag `env`,
//! uppercase, joined with `_`:
//!
//! | Field | Env var |
//! |-------|---------|
//! | `host` | `HOST` |
//! | `port` (tagged) | `LISTEN_PORT` |
//! | `database.url` | `DATABASE_URL` |
//!
//! Embedded sub-records (`embed` entries) contribute their fields at the
//! parent's level. When two fields produce the same key, the one declared
//! closer to the root wins. A tag value of `-` excludes a field.
//!
//! Key maps depend only on the type and the policy, so they are cached in a
//! [`FieldMapCache`]. Share one cache between decoders to build each map once.
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`]. [`Flow::load`] keeps going
//! after a failing step and returns every error; [`Flow::load_fail_fast`]
//! stops at the first one.

mod macros;

pub mod error;
pub mod mapper;
pub mod types;
pub mod unmarshal;
pub mod value;

mod builder;
mod decoder;
mod env;
mod file;
mod flow;
pub(crate) mod merge;
mod shape;
mod source;
mod structs;

#[cfg(test)]
mod fixtures;

pub use builder::FlowBuilder;
pub use decoder::Decoder;
pub use env::EnvSource;
pub use error::{Error, ParseError};
pub use file::{BytesDecoder, FileDecoder};
pub use flow::Flow;
pub use mapper::{
    FieldMapCache, KeyReducer, MappedField, Mapper, MapperOptions, NameTransform, TypeMap,
};
pub use shape::{
    FieldMut, FieldPath, FieldRef, FieldShape, Leaf, Record, RecordShape, ShapeFn, leaf_at,
    leaf_at_mut,
};
pub use source::{KvDecoder, KvSource};
pub use structs::StructSource;
pub use types::Format;
pub use unmarshal::{Unmarshaller, merge_into, unmarshal_into};
pub use value::{Mapping, Value, ValueError};
