//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod customers;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::RequireCustomer;
pub use router::create_router_with_state;
pub use state::{AppState, CustomerServiceTrait};
