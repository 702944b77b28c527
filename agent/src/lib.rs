pub mod api;
pub mod collector;
