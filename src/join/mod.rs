pub mod resolver;

pub use resolver::JoinResolver;
