pub mod clock;
pub mod store;

mod macros;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{SweeperHandle, TtlCache};
