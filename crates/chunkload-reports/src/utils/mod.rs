pub mod bytes;
pub mod numbers;
