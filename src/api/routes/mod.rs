pub mod alerts;
pub mod auth;
pub mod state;
