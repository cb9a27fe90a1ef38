pub mod announcement;
pub mod audit;
pub mod identity;

pub use announcement::*;
pub use audit::*;
pub use identity::*;
