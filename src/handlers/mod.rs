mod greeting;
mod health;

pub use greeting::{GREETING, greeting};
pub use health::{HealthResponse, health_check};
