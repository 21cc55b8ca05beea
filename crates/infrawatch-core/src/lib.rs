pub mod explain;
pub mod optimizer;
pub mod scoring;
pub mod validation;

pub use explain::*;
pub use optimizer::*;
pub use scoring::*;
pub use validation::*;
