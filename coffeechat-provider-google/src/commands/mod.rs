pub mod auth_init;
pub mod auth_submit;
pub mod create_event;
pub mod fetch_roster;
pub mod query_free_busy;
pub mod session;
