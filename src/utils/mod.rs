pub mod error;
pub mod latch;
