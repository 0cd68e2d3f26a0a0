mod ctl;

pub use ctl::*;
