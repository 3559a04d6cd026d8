//! HTML page handlers.

pub mod accounts;
pub mod boards;
pub mod password;

pub use accounts::*;
pub use boards::*;
pub use password::*;
