pub mod ids;
pub mod payload;

pub use ids::publish_ids;
pub use payload::publish_payload;
