pub mod response;
pub mod routes;
