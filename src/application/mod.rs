pub mod board;
pub mod confirm;
pub mod preferences;
pub mod task_store;

mod task_store_tests;
