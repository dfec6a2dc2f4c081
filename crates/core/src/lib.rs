pub mod builder;
pub mod error;
pub mod export;
pub mod model;
pub mod mutation;
pub mod search;
pub mod treemap;

pub use builder::*;
pub use error::TreeError;
pub use model::*;
pub use treemap::*;
