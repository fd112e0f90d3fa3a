//! External service integrations.

pub mod geocoding {
    pub use crate::geocoding::*;
}

pub mod solar {
    pub use crate::solar::*;
}

pub mod llm {
    pub use crate::llm::*;
}

pub mod narrative {
    pub use crate::narrative::*;
}

pub mod services {
    pub use crate::services::*;
}
