//! Response decoder module
//!
//! Decodes a page body into the caller's chosen type.
//!
//! # Overview
//!
//! Canvas answers with a JSON object for single resources and a JSON array
//! for lists. Unknown fields are ignored. On failure the error names the
//! expected type and the JSON path where decoding stopped, e.g.
//! `Module: [1].items_count: invalid type: string "x", expected u64`.

mod decoder;

pub use decoder::{decode_page, shape_name, ListPage};
