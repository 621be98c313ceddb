pub mod history;
pub mod ledger;
pub mod live;

pub use history::TickHistory;
pub use ledger::TradeLedger;
pub use live::{spawn, RuntimeHandle, RuntimeSettings};
