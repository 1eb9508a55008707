//! CLI command implementations.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add-channel` | Track a keyword in one channel |
//! | `add-server` | Track a keyword in every channel of a server |
//! | `list` | List a user's keywords in a server |
//! | `remove` | Stop tracking a keyword in a server |
//! | `replay` | Run recorded messages through the watcher |
//! | `config` | Show the effective configuration |
//!
//! ```bash
//! keyword-notifier add-server --user 42 --server 10 세일
//! keyword-notifier replay --directory platform.toml --messages day.jsonl
//! ```

mod config;
mod keyword;
mod replay;

pub use config::cmd_config_show;
pub use keyword::{cmd_add_channel, cmd_add_server, cmd_list, cmd_remove};
pub use replay::{ReplayTotals, cmd_replay, parse_messages};
