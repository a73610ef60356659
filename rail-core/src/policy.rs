use serde::{Deserialize, Serialize};

/// How seat numbers are compared when choosing seats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatOrdering {
    /// Row label by length then letters, then numeric column: A2 < A10 < B1.
    #[default]
    Natural,
    /// Plain string order: A10 < A2.
    Lexicographic,
}

/// Booking behaviour switches, loaded from the `booking` config section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BookingPolicy {
    /// Debit the wallet when the ticket is created.
    pub charge_at_booking: bool,
    /// Soft-lock allocated seats as Reserved while the ticket is Pending.
    pub reserve_on_add: bool,
    pub seat_ordering: SeatOrdering,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            charge_at_booking: true,
            reserve_on_add: true,
            seat_ordering: SeatOrdering::Natural,
        }
    }
}
