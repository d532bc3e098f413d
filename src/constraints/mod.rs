pub mod frame;
pub mod function;
pub mod projector;
