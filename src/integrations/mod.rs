//! Real backend and typed client.

pub mod transport {
    pub use crate::transport::*;
}

pub mod client {
    pub use crate::client::*;
}
