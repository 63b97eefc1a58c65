pub mod database;
pub mod errors;
pub mod model;
pub mod observability;
pub mod poller;
pub mod services;
pub mod shutdown;
