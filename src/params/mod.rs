//! Parameter encoding module
//!
//! Turns a heterogeneous key/value map into query-string or form-body pairs
//! following the Rails conventions Canvas expects:
//!
//! - scalars: `key=value`
//! - lists: `key[]=a&key[]=b`
//! - nested maps: `key[sub]=value`
//!
//! Optional values are only present when set; `Params::insert_opt` skips
//! `None` so the encoder never sees an "unset" value.

mod encoder;
mod types;

pub use encoder::{encode_pairs, to_query_string};
pub use types::{ApiEnum, ParamValue, Params, ToParam};
