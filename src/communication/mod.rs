pub mod messages;
pub mod snapshot_stream;
