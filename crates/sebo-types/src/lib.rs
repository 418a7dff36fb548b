pub mod api;
pub mod enums;
pub mod patch;
