pub mod application;
pub mod bus;
pub mod domain;
pub mod interfaces;
pub mod privacy;
pub mod publish;
pub mod registration;
pub mod security;
