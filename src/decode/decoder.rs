//! Page decoding

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::sync::LazyLock;

/// Matches module path prefixes such as `alloc::vec::`
static MODULE_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[a-z_][a-z0-9_]*::)+").expect("module path regex is valid"));

/// Short, readable name of a type: `alloc::vec::Vec<my_app::Course>` becomes
/// `Vec<Course>`.
pub fn shape_name<T: ?Sized>() -> String {
    MODULE_PATH_REGEX
        .replace_all(std::any::type_name::<T>(), "")
        .into_owned()
}

/// Decode one page body into `T`.
///
/// A blank body is treated as `null`, so types that accept `null` (such as
/// [`ListPage`] or `Option<_>`) decode it as empty. Trailing data after the
/// JSON value is an error.
pub fn decode_page<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };

    let mut de = serde_json::Deserializer::from_slice(body);
    let value: T = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        Error::decode(shape_name::<T>(), e.path().to_string(), e.inner().to_string())
    })?;
    de.end()
        .map_err(|e| Error::decode(shape_name::<T>(), ".", e.to_string()))?;
    Ok(value)
}

/// One page of a list endpoint.
///
/// Accepts a JSON array, or `null` for an empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T>(pub Vec<T>);

impl<T> ListPage<T> {
    /// Items on this page
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the page holds no items
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> IntoIterator for ListPage<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ListPage<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<T>>::deserialize(deserializer).map(|items| Self(items.unwrap_or_default()))
    }
}
