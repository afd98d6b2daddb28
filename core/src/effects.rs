mod bus;
pub use bus::*;

mod compressor;
pub use compressor::*;

mod filter;
pub use filter::*;

mod limiter;
pub use limiter::*;
