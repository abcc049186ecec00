pub mod access;
pub mod resource;

pub use resource::Resource;
