pub mod config;
pub mod dispatcher;
pub mod histogram;
pub mod partition;
pub mod report;
pub mod worker;
pub mod workload;
