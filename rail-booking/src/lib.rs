pub mod accounts;
pub mod error;
pub mod fleet;
pub mod ledger;
mod load;
pub mod locks;
pub mod notice;
mod queries;
pub mod stations;
pub mod view;
pub mod workflow;

pub use accounts::AccountService;
pub use error::{BookingError, BookingResult};
pub use fleet::{NewTrain, TrainChange, TrainService};
pub use ledger::{EntryKind, LedgerEntry, LedgerError, WalletLedger};
pub use locks::{BookingLocks, KeyedLocks};
pub use stations::{NewStation, StationService};
pub use view::{PassengerView, TicketView};
pub use workflow::TicketWorkflow;
