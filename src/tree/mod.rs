pub mod block;
pub mod builder;
pub mod tree;
