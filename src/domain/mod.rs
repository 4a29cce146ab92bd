pub mod configuration;
pub mod financial;
pub mod ratings;
pub mod weather;

pub use configuration::*;
pub use financial::*;
pub use ratings::*;
pub use weather::*;
