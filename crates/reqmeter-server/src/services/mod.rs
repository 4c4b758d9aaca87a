//! Application endpoints measured by the interceptor.

pub mod data;

pub use data::{get_data, post_data, root, DataItem};
