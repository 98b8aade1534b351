//! Access resolution: who may see or change which item.

pub mod resolver;

pub use resolver::AccessResolver;
