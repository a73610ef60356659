use std::cmp::Ordering;
use std::fmt;

use rail_core::{Seat, SeatOrdering};
use uuid::Uuid;

use crate::inventory::InventoryError;

pub const SEATS_PER_ROW: u32 = 10;

/// A seat label such as `A7` or `B10`.
///
/// Each row holds columns 1-10; the row letter advances after column 10. Rows
/// after `Z` continue `AA`, `AB`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatNumber {
    row: String,
    column: u32,
    position: u32,
}

impl SeatNumber {
    pub fn parse(raw: &str) -> Result<Self, InventoryError> {
        let invalid = || InventoryError::InvalidSeatNumber(raw.to_string());
        let split = raw
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(raw.len());
        let (row, digits) = raw.split_at(split);

        if row.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let column: u32 = digits.parse().map_err(|_| invalid())?;
        if column == 0 || column > SEATS_PER_ROW {
            return Err(invalid());
        }

        let position = row_index(row)
            .and_then(|index| index.checked_mul(SEATS_PER_ROW))
            .and_then(|base| base.checked_add(column))
            .ok_or_else(invalid)?;

        Ok(Self {
            row: row.to_string(),
            column,
            position,
        })
    }

    /// The seat at 1-based `position` in generation order.
    pub fn at_position(position: u32) -> Self {
        let offset = position.saturating_sub(1);
        Self {
            row: row_label(offset / SEATS_PER_ROW),
            column: offset % SEATS_PER_ROW + 1,
            position: offset + 1,
        }
    }

    pub fn row(&self) -> &str {
        &self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// 1-based generation order: `A1` is 1, `B1` is 11.
    pub fn position(&self) -> u32 {
        self.position
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

/// Spreadsheet-style row label: 0 -> A, 25 -> Z, 26 -> AA.
pub fn row_label(index: u32) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        n -= 1;
        label.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Inverse of [`row_label`]. `None` when the label overflows.
fn row_index(label: &str) -> Option<u32> {
    label
        .bytes()
        .try_fold(0u32, |acc, b| acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1))
        .map(|n| n - 1)
}

/// Compare two seat labels under `ordering`. Labels that do not parse sort by
/// plain string order.
pub fn compare(ordering: SeatOrdering, a: &str, b: &str) -> Ordering {
    match ordering {
        SeatOrdering::Lexicographic => a.cmp(b),
        SeatOrdering::Natural => match (SeatNumber::parse(a), SeatNumber::parse(b)) {
            (Ok(x), Ok(y)) => x.position.cmp(&y.position),
            _ => a.cmp(b),
        },
    }
}

/// Fresh seat map of `total` Available seats.
pub fn generate_seats(train_id: Uuid, total: u32) -> Vec<Seat> {
    seats_from(train_id, 1, total)
}

/// `count` seats continuing the numbering at `first_position`.
pub(crate) fn seats_from(train_id: Uuid, first_position: u32, count: u32) -> Vec<Seat> {
    (first_position..first_position + count)
        .map(|position| Seat::new(train_id, SeatNumber::at_position(position).to_string()))
        .collect()
}
