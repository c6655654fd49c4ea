pub mod employee;
pub mod location;
pub mod role;
pub mod session;
pub mod settings;
