use rail_core::{Station, Ticket, Train};

const DATE_FORMAT: &str = "%d-%m-%Y";

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// HTML body of a ticket notification.
pub fn render(ticket: &Ticket, train: &Train, source: &Station, destination: &Station) -> String {
    let passengers: String = ticket
        .passengers
        .iter()
        .map(|p| {
            let seat = p
                .seat_id
                .and_then(|id| train.seat(id))
                .map(|s| s.seat_number.as_str())
                .unwrap_or("Not Assigned");
            format!(
                "<li><strong>Name:</strong> {}, <strong>Age:</strong> {}, <strong>Seat:</strong> {}</li>",
                escape(&p.name),
                p.age,
                seat
            )
        })
        .collect();

    format!(
        "<html><body>\
         <h2>Ticket Confirmation</h2>\
         <p><strong>PNR:</strong> {pnr}</p>\
         <p><strong>Train Name:</strong> {train}</p>\
         <p><strong>Source Station:</strong> {source}</p>\
         <p><strong>Destination Station:</strong> {destination}</p>\
         <p><strong>Journey Date:</strong> {journey}</p>\
         <p><strong>Booking Date:</strong> {booked}</p>\
         <p><strong>Total Amount:</strong> {total}</p>\
         <p><strong>Payment Status:</strong> {payment}</p>\
         <p><strong>Ticket Status:</strong> {status}</p>\
         <h3>Passenger Details:</h3>\
         <ul>{passengers}</ul>\
         </body></html>",
        pnr = ticket.id,
        train = escape(&train.name),
        source = escape(&source.name),
        destination = escape(&destination.name),
        journey = ticket.journey_date.format(DATE_FORMAT),
        booked = ticket.booking_date.format(DATE_FORMAT),
        total = ticket.total_amount,
        payment = ticket.payment_status,
        status = ticket.status,
        passengers = passengers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rail_core::{Passenger, PaymentStatus, Route, Seat, TicketStatus};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_render_lists_passengers_and_dates() {
        let source = Station::new("Chennai Central", "MAS", "600003");
        let destination = Station::new("Bengaluru City", "SBC", "560023");
        let route = Route {
            source_station_id: source.id,
            destination_station_id: destination.id,
            intermediate_station_ids: vec![],
            distance_km: 362,
            duration_minutes: 300,
        };
        let mut train = Train::new("Shatabdi <Express>", "12007", Decimal::new(100, 0), route);
        train.seats.push(Seat::new(train.id, "A1"));

        let ticket_id = Uuid::new_v4();
        let ticket = Ticket {
            id: ticket_id,
            train_id: train.id,
            user_id: Uuid::new_v4(),
            source_station_id: source.id,
            destination_station_id: destination.id,
            journey_date: NaiveDate::from_ymd_opt(2026, 12, 5).unwrap(),
            booking_date: Utc.with_ymd_and_hms(2026, 11, 20, 9, 30, 0).unwrap(),
            passengers: vec![
                Passenger {
                    id: Uuid::new_v4(),
                    ticket_id,
                    name: "Arjun".to_string(),
                    age: 41,
                    gender: None,
                    seat_id: Some(train.seats[0].id),
                },
                Passenger {
                    id: Uuid::new_v4(),
                    ticket_id,
                    name: "Divya".to_string(),
                    age: 9,
                    gender: None,
                    seat_id: None,
                },
            ],
            total_amount: Decimal::new(200, 0),
            payment_status: PaymentStatus::Paid,
            status: TicketStatus::Pending,
            updated_at: Utc::now(),
        };

        let html = render(&ticket, &train, &source, &destination);

        assert!(html.contains(&ticket_id.to_string()));
        assert!(html.contains("Shatabdi &lt;Express&gt;"));
        assert!(html.contains("<strong>Journey Date:</strong> 05-12-2026"));
        assert!(html.contains("<strong>Booking Date:</strong> 20-11-2026"));
        assert!(html.contains("<strong>Payment Status:</strong> PAID"));
        assert!(html.contains("<strong>Ticket Status:</strong> PENDING"));
        assert!(html.contains("<strong>Name:</strong> Arjun, <strong>Age:</strong> 41"));
        assert!(html.contains("<strong>Seat:</strong> A1"));
        assert!(html.contains("<strong>Seat:</strong> Not Assigned"));
    }
}
