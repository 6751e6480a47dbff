// HTTP action surface invoked by the UI layer

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::ApiServer;

#[cfg(test)]
mod tests;
