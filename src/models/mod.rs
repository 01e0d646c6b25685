pub mod analysis;
pub mod coordinate;
pub mod place;
pub mod recommendation;
pub mod report;
pub mod series;
pub mod vegetation;

pub use analysis::*;
pub use coordinate::*;
pub use place::*;
pub use recommendation::*;
pub use report::*;
pub use series::*;
pub use vegetation::*;
