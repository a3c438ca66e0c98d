pub mod filter;
pub mod rules;

pub use filter::filter_payload;
