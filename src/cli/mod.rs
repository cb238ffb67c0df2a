//! CLI command implementations.
//!
//! Each command runs as one unit of work on a shared
//! [`ConnectionProvider`](crate::storage::ConnectionProvider) and writes its
//! output to the writer it is given.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init-db` | Create the `egresados` table if missing |
//! | `add` | Register a graduate |
//! | `update` | Rewrite every non-key field of a graduate |
//! | `get` | Print one graduate as JSON |
//! | `delete` | Remove a graduate |
//! | `list` | List or search the roster |
//! | `stats` | Graduates per career |

// Allow pass-by-value for command functions (consistent with main.rs)
#![allow(clippy::needless_pass_by_value)]

mod records;
mod roster;
mod stats;

pub use records::{RecordArgs, cmd_add, cmd_delete, cmd_get, cmd_update};
pub use roster::{OutputFormat, cmd_list, write_json, write_table};
pub use stats::{cmd_init_db, cmd_stats, write_summary};
