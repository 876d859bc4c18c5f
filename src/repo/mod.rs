pub mod error;
pub mod category;
pub mod activity;
pub mod tag;
pub mod fact;

pub use error::*;
pub use category::*;
pub use activity::*;
pub use tag::*;
pub use fact::*;
