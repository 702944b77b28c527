pub mod app;

pub use app::{body_json, get, make_test_app};
