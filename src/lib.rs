pub mod app;
pub mod core;
pub mod dispatcher;
pub mod receiver;
pub mod registry;
pub mod scanner;
pub mod store;
