//! Progress reporting and cooperative cancellation
//!
//! A [`Progress`] handle is passed into every request. The engine adds work
//! when a request starts, grows the estimate as pagination reveals more pages,
//! finishes one unit per decoded page, and checks for cancellation before
//! each HTTP call.

mod handle;

pub use handle::{Progress, ProgressListener, ProgressSnapshot};

#[cfg(test)]
mod tests;
