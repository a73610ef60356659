use rust_decimal::Decimal;

/// Ticket pricing. Every passenger pays the train's flat fare.
#[derive(Debug, Clone, Copy, Default)]
pub struct FareCalculator;

impl FareCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn total_amount(&self, fare: Decimal, passengers: usize) -> Decimal {
        fare * Decimal::from(passengers as u64)
    }
}
