//! External service integrations.

pub mod ghl_client {
    pub use crate::ghl_client::*;
}

pub mod ghl_models {
    pub use crate::ghl_models::*;
}

pub mod circuit_breaker {
    pub use crate::circuit_breaker::*;
}
