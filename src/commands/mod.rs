//! CLI command handlers.

mod records;
mod sync;
mod track;

pub use records::{
    run_list_command, run_locations_command, run_relocate_command, run_remove_command,
    run_show_command,
};
pub use sync::{run_sync_command, run_watch_command};
pub use track::run_add_command;
