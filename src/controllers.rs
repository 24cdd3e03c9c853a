pub mod service;
pub mod status;
