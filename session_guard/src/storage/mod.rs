mod config;
mod types;

pub(crate) use config::{DB_TABLE_SESSIONS, GENERIC_DATA_STORE};
