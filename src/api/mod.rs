// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod ghl_handler {
    pub use crate::ghl_handler::*;
}

pub mod lead_handler {
    pub use crate::lead_handler::*;
}

pub mod routes {
    pub use crate::routes::*;
}
