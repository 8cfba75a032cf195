pub mod error;
pub mod storage;
pub mod task;
pub mod view;
