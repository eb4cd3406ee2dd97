pub mod core;
pub mod errors;
pub mod logging;
pub mod storage;
