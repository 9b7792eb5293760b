//! Dispatch infrastructure: the [`Handler`] trait and the [`Registry`]
//! keyed by [`purple_proto::CommandKey`].

pub mod registry;
pub mod traits;

pub use registry::{HandlerEntry, Registry};
pub use traits::Handler;
