// Domain-layer modules and shared errors/models
pub mod collector {
    pub use crate::collector::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod quote {
    pub use crate::quote::*;
}

pub mod leads {
    pub use crate::leads::*;
}

pub mod errors {
    pub use crate::errors::*;
}
