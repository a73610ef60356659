pub mod fare;
pub mod inventory;
pub mod layout;

pub use fare::FareCalculator;
pub use inventory::{InventoryError, SeatInventory};
pub use layout::{generate_seats, SeatNumber, SEATS_PER_ROW};
