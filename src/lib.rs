pub mod command_handler;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod logging;
pub mod member_events;
pub mod message_components;
pub mod permissions;
pub mod registry;
