//! Declarative endpoints
//!
//! An [`Endpoint`] describes one Canvas API call as data: its method, path,
//! parameters and [`ResponseShape`]. [`Canvas::send`](crate::Canvas::send)
//! runs it through the engine and returns the accumulated output, so
//! per-endpoint wrappers reduce to a struct and a trait impl:
//!
//! ```no_run
//! use canvas_api::endpoint::{Endpoint, Many};
//! use canvas_api::{Params, Result};
//!
//! #[derive(serde::Deserialize)]
//! struct Module {
//!     id: u64,
//!     name: String,
//! }
//!
//! struct ListModules {
//!     course_id: u64,
//!     search_term: Option<String>,
//! }
//!
//! impl Endpoint for ListModules {
//!     type Shape = Many<Module>;
//!
//!     fn path(&self) -> String {
//!         format!("courses/{}/modules", self.course_id)
//!     }
//!
//!     fn params(&self) -> Result<Params> {
//!         Ok(Params::new().with_opt("search_term", self.search_term.clone()))
//!     }
//! }
//! ```

use crate::decode::ListPage;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::types::{JsonObject, Method};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// How pages of a response combine into one result
pub trait ResponseShape {
    /// What each page decodes into
    type Page: DeserializeOwned + Send;
    /// Accumulated result
    type Output: Send;

    /// Merge one page into the running result
    fn accumulate(acc: Option<Self::Output>, page: Self::Page) -> Self::Output;

    /// Produce the final result once pagination ends
    fn finish(acc: Option<Self::Output>) -> Result<Self::Output>;
}

/// A single object; the last page received wins
#[derive(Debug, Clone, Copy, Default)]
pub struct One<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send> ResponseShape for One<T> {
    type Page = T;
    type Output = T;

    fn accumulate(_acc: Option<T>, page: T) -> T {
        page
    }

    fn finish(acc: Option<T>) -> Result<T> {
        acc.ok_or_else(|| Error::Other("response contained no pages".to_string()))
    }
}

/// A list spread over any number of pages, concatenated in order
#[derive(Debug, Clone, Copy, Default)]
pub struct Many<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send> ResponseShape for Many<T> {
    type Page = ListPage<T>;
    type Output = Vec<T>;

    fn accumulate(acc: Option<Vec<T>>, page: ListPage<T>) -> Vec<T> {
        let mut items = acc.unwrap_or_default();
        items.extend(page);
        items
    }

    fn finish(acc: Option<Vec<T>>) -> Result<Vec<T>> {
        Ok(acc.unwrap_or_default())
    }
}

/// An untyped JSON object
pub type Untyped = One<JsonObject>;

/// One Canvas API call
pub trait Endpoint: Send + Sync {
    /// Response shape
    type Shape: ResponseShape;

    /// HTTP method
    fn method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the API root, e.g. `courses/1/modules`
    fn path(&self) -> String;

    /// Request parameters
    fn params(&self) -> Result<Params> {
        Ok(Params::new())
    }
}
