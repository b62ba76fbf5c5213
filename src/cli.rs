//! CLI domain: parse, route, and presentation only.
//! No coordination logic; the route table dispatches to the server and the peer client.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands};
pub use presentation::{format_consistency_json, format_consistency_text};
pub use route::{CommandOutput, RunContext};
