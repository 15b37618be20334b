pub mod timer;

pub use timer::timed;
