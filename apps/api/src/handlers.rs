pub mod assignments;
pub mod audit;
pub mod authorization;
pub mod catalog;
pub mod health;
pub mod members;
pub mod platform;
pub mod roles;
