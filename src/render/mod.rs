pub mod ticker;

pub use ticker::{TickAction, TickSchedule, Ticker};
