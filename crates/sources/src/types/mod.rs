mod command;
mod hardware;
mod prediction;
mod satellite;
mod stream;

pub use command::*;
pub use hardware::*;
pub use prediction::*;
pub use satellite::*;
pub use stream::*;
