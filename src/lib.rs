//! Possum: coordinated alive/dead state for a passel
//!
//! Every instance of an identically deployed application runs a possum. The possums in a
//! passel keep a shared record of which instances are alive, check that they all agree, and
//! apply changes everywhere while refusing any change that would leave nobody alive.

pub mod cli;
pub mod concurrency;
pub mod config;
pub mod consistency;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod guard;
pub mod logging;
pub mod peer;
pub mod server;
pub mod store;
pub mod types;
pub mod wire;
