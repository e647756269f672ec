pub mod control;
pub mod lifecycle;
pub mod poller;
