//! Persisted widget state.
//!
//! Widget state (a grid's page, a tab's active index) is encoded with
//! [`encode`] and stored in the URL, local storage or session storage
//! through a [`StateHandler`].

mod codec;
mod handler;
mod storage;

pub use codec::*;
pub use handler::*;
pub use storage::*;
