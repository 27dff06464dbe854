pub mod balancer;
pub mod selector;
pub mod weights;
