pub mod availability;
pub mod backup;
pub mod core;
pub mod evidence;
pub mod schedule;
pub mod users;
