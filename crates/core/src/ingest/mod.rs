pub mod normalize;
pub mod tables;
