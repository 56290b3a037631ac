pub mod config;
pub mod logging;

pub mod checksum;
pub mod listing;
pub mod oracle;
pub mod reconcile;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod task;
pub mod transfer;
