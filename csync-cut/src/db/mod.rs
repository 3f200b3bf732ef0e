//! Record store access for csync-cut
//!
//! Schema creation lives in `csync_common::db`; this module holds the song
//! repository used by the jobs and the HTTP API.

pub mod songs;

pub use csync_common::db::{create_songs_table, init_database};
pub use songs::{NewSong, SongRecord};
