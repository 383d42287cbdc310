pub mod cost;
pub mod finding;
pub mod protocol;
pub mod recommendation;

pub use cost::*;
pub use finding::*;
pub use protocol::*;
pub use recommendation::*;
