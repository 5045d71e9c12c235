pub mod routes;

// Re-export route handlers for convenience
pub use routes::alerts;
pub use routes::auth;
