pub mod analysis;
pub mod content;
pub mod contract;
pub mod market;
pub mod recommendation;
pub mod sentiment;
