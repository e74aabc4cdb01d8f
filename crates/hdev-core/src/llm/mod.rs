//! Model API abstraction

pub mod api;

pub use api::ModelApi;
#[cfg(test)]
pub use api::MockModelApi;
