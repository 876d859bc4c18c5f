pub mod app_dirs;
pub mod date;
pub mod timeframe;

pub use app_dirs::*;
pub use date::*;
pub use timeframe::*;
