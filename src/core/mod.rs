pub mod apportionment;
pub mod record;
pub mod session_store;

pub use crate::domain::model::{AllocationResult, Party, Quotient, Session};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
