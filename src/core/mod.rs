pub mod aggregate;
pub mod dashboard;
pub mod employees;
pub mod lifecycle;
pub mod locations;
pub mod log;
pub mod settings;
pub mod token;
