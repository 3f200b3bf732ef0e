//! Database schema and connection setup shared by ChoreoSync services

pub mod init;

pub use init::{create_songs_table, init_database};
