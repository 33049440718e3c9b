//! In-memory stand-ins for `/proc` and memcached servers, used in tests.

mod filesystem;
pub mod scenarios;
mod transport;

pub use filesystem::MockFs;
pub use transport::MockTransport;
