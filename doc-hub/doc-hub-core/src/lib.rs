pub mod access;
pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod storage;
