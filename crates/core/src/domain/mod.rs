pub mod article;
pub mod contract;
pub mod forecast;
pub mod policy;
pub mod recommendation;
pub mod scenario;
