//! HTTP API handlers for vh-verify
//!
//! JSON request/response over axum. Every route except `/health` lives
//! under `/api`.

pub mod analyze;
pub mod health;
pub mod influencers;
pub mod verify;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use influencers::influencer_routes;
pub use verify::verify_routes;
