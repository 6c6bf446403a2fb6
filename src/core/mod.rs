pub mod circular_buffer;
pub mod config;
pub mod events;
pub mod frame;
pub mod heartbeat;
pub mod metrics;
pub mod payload;
pub mod queue;
pub mod reconnect;
pub mod timer;
pub mod types;

pub use circular_buffer::*;
pub use config::*;
pub use events::*;
pub use frame::*;
pub use heartbeat::*;
pub use metrics::*;
pub use payload::*;
pub use queue::*;
pub use reconnect::*;
pub use timer::*;
pub use types::*;
