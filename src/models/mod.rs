pub mod etf;
pub mod response;

pub use etf::*;
pub use response::*;
