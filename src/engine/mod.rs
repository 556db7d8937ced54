// Engine Module
// Statement transport used to reach the review engine

pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{GatewayError, GatewayResult};
pub use traits::StatementExecutor;
pub use types::*;
