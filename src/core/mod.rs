// Domain-layer modules and shared errors/models
pub mod estimator {
    pub use crate::estimator::*;
}

pub mod leads {
    pub use crate::leads::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod pipeline {
    pub use crate::pipeline::*;
}

pub mod store {
    pub use crate::store::*;
}

pub mod tariff {
    pub use crate::tariff::*;
}

pub mod errors {
    pub use crate::errors::*;
}
