// Domain-layer modules and shared errors/models
pub mod analytics {
    pub use crate::analytics::*;
}

pub mod transforms {
    pub use crate::transforms::*;
}

pub mod resolution {
    pub use crate::resolution::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
