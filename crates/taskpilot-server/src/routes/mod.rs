//! Route handlers

pub mod chat;
pub mod events;
pub mod health;
pub mod tasks;
