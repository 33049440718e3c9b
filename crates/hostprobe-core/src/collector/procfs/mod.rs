//! Readers for the Linux `/proc` filesystem.

pub mod cmdline;

pub use cmdline::{CONNECTION_LIMIT_FLAG, parse_connection_limit, read_connection_limit};
