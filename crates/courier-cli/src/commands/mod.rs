pub mod add;
pub mod common;
pub mod delete;
pub mod list;
pub mod queue;
pub mod seed;
pub mod show;
pub mod status;
pub mod sync;
pub mod watch;
