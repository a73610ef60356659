mod support;

use std::collections::HashSet;
use std::sync::Arc;

use rail_booking::BookingError;
use rail_core::notification::{SUBJECT_APPROVAL, SUBJECT_BOOKING, SUBJECT_CANCELLATION, SUBJECT_UPDATE};
use rail_core::ticket::JourneyChange;
use rail_core::{BookingPolicy, PaymentStatus, SeatStatus, TicketStatus};
use rust_decimal::Decimal;
use support::{fixture, RecordingSender, Setup};
use uuid::Uuid;

#[tokio::test]
async fn test_add_books_two_passengers_on_two_seat_train() {
    let fx = fixture(Setup { seats: 2, fare: 100, balance: 500, ..Default::default() }).await;

    let view = fx.workflow.add(fx.request(&["Asha", "Ravi"])).await.unwrap();

    assert_eq!(view.total_amount, Decimal::new(200, 0));
    assert_eq!(view.status, TicketStatus::Pending);
    assert_eq!(view.payment_status, PaymentStatus::Paid);

    // Distinct seats, one per passenger
    let seats: HashSet<_> = view.passengers.iter().map(|p| p.seat_id.unwrap()).collect();
    assert_eq!(seats.len(), 2);
    assert_eq!(view.seat_numbers(), vec!["A1", "A2"]);

    let train = fx.stored_train().await;
    assert_eq!(train.available_seats, 0);
    assert!(train.seats.iter().all(|s| s.status == SeatStatus::Reserved));

    assert_eq!(fx.balance().await, Decimal::new(300, 0));
    assert_eq!(fx.notifier.subjects(), vec![SUBJECT_BOOKING]);
}

#[tokio::test]
async fn test_add_fails_without_enough_seats_and_changes_nothing() {
    let fx = fixture(Setup { seats: 1, balance: 500, ..Default::default() }).await;

    let err = fx.workflow.add(fx.request(&["Asha", "Ravi"])).await.unwrap_err();

    assert!(matches!(
        err,
        BookingError::InsufficientSeats { requested: 2, available: 1 }
    ));
    assert_eq!(fx.balance().await, Decimal::new(500, 0));
    assert_eq!(fx.ticket_count().await, 0);
    assert_eq!(fx.stored_train().await.available_seats, 1);
    assert!(fx.notifier.subjects().is_empty());
}

#[tokio::test]
async fn test_add_fails_on_insufficient_balance() {
    let fx = fixture(Setup { fare: 100, balance: 50, ..Default::default() }).await;

    let err = fx.workflow.add(fx.request(&["Asha"])).await.unwrap_err();

    match err {
        BookingError::InsufficientBalance { available, requested, .. } => {
            assert_eq!(available, Decimal::new(50, 0));
            assert_eq!(requested, Decimal::new(100, 0));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.balance().await, Decimal::new(50, 0));
    assert_eq!(fx.ticket_count().await, 0);
    // The reservation made in memory never reached the store
    assert_eq!(fx.stored_train().await.available_seats, 10);
}

#[tokio::test]
async fn test_cancel_paid_booked_ticket_refunds_and_frees_seats() {
    let fx = fixture(Setup { seats: 4, fare: 150, balance: 170, ..Default::default() }).await;

    let created = fx.workflow.add(fx.request(&["Meera"])).await.unwrap();
    assert_eq!(fx.balance().await, Decimal::new(20, 0));

    fx.workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();
    assert_eq!(fx.stored_train().await.available_seats, 3);

    let cancelled = fx
        .workflow
        .cancel_ticket(created.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status, TicketStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(fx.balance().await, Decimal::new(170, 0));

    let train = fx.stored_train().await;
    assert_eq!(train.available_seats, 4);
    assert!(train.seats.iter().all(|s| s.is_available() && s.passenger_id.is_none()));

    assert_eq!(
        fx.notifier.subjects(),
        vec![SUBJECT_BOOKING, SUBJECT_APPROVAL, SUBJECT_CANCELLATION]
    );
}

#[tokio::test]
async fn test_approve_assigns_exactly_the_remaining_seats() {
    let policy = BookingPolicy { reserve_on_add: false, ..Default::default() };
    let fx = fixture(Setup { seats: 3, policy, ..Default::default() }).await;

    let created = fx.workflow.add(fx.request(&["A", "B", "C"])).await.unwrap();
    // Nothing held until approval
    assert!(created.passengers.iter().all(|p| p.seat_id.is_none()));
    assert_eq!(fx.stored_train().await.available_seats, 3);

    let approved = fx
        .workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();

    assert_eq!(approved.status, TicketStatus::Booked);
    assert_eq!(approved.seat_numbers(), vec!["A1", "A2", "A3"]);
    let train = fx.stored_train().await;
    assert_eq!(train.available_seats, 0);
    assert!(train.seats.iter().all(|s| s.status == SeatStatus::Booked));
}

#[tokio::test]
async fn test_approve_keeps_reserved_seats() {
    let fx = fixture(Setup::default()).await;

    let created = fx.workflow.add(fx.request(&["Kabir", "Zoya"])).await.unwrap();
    let approved = fx
        .workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();

    let before: Vec<_> = created.passengers.iter().map(|p| p.seat_id).collect();
    let after: Vec<_> = approved.passengers.iter().map(|p| p.seat_id).collect();
    assert_eq!(before, after);

    let train = fx.stored_train().await;
    for passenger in &approved.passengers {
        let seat = train.seat(passenger.seat_id.unwrap()).unwrap();
        assert_eq!(seat.status, SeatStatus::Booked);
        assert_eq!(seat.passenger_id, Some(passenger.id));
    }
    assert_eq!(train.available_seats, 8);
}

#[tokio::test]
async fn test_approve_fails_when_seats_ran_out_before_approval() {
    let policy = BookingPolicy { reserve_on_add: false, ..Default::default() };
    let fx = fixture(Setup { seats: 2, policy, ..Default::default() }).await;

    let first = fx.workflow.add(fx.request(&["A", "B"])).await.unwrap();
    let second = fx.workflow.add(fx.request(&["C"])).await.unwrap();
    fx.workflow
        .approve_ticket(first.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();

    let err = fx
        .workflow
        .approve_ticket(second.ticket_id, TicketStatus::Booked)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::InsufficientSeats { requested: 1, available: 0 }
    ));

    // Still pending
    let ticket = fx.workflow.get_by_id(second.ticket_id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Pending);
}

#[tokio::test]
async fn test_pending_to_pending_is_a_no_op() {
    let fx = fixture(Setup::default()).await;
    let created = fx.workflow.add(fx.request(&["Ishaan"])).await.unwrap();

    let view = fx
        .workflow
        .approve_ticket(created.ticket_id, TicketStatus::Pending)
        .await
        .unwrap();

    assert_eq!(view.status, TicketStatus::Pending);
    assert_eq!(fx.notifier.subjects(), vec![SUBJECT_BOOKING]);
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let fx = fixture(Setup::default()).await;
    let created = fx.workflow.add(fx.request(&["Tara"])).await.unwrap();
    let id = created.ticket_id;

    // Approval cannot cancel
    let err = fx.workflow.approve_ticket(id, TicketStatus::Cancelled).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));

    // Cancellation only accepts Cancelled
    let err = fx.workflow.cancel_ticket(id, TicketStatus::Booked).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));

    fx.workflow.approve_ticket(id, TicketStatus::Booked).await.unwrap();

    // Booked cannot go back to Pending
    let err = fx.workflow.approve_ticket(id, TicketStatus::Pending).await.unwrap_err();
    match err {
        BookingError::InvalidTransition { from, to } => {
            assert_eq!(from, "BOOKED");
            assert_eq!(to, "PENDING");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_double_cancel_does_not_refund_twice() {
    let fx = fixture(Setup { fare: 100, balance: 300, ..Default::default() }).await;
    let created = fx.workflow.add(fx.request(&["Nina"])).await.unwrap();

    fx.workflow
        .cancel_ticket(created.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(fx.balance().await, Decimal::new(300, 0));

    let err = fx
        .workflow
        .cancel_ticket(created.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
    assert_eq!(fx.balance().await, Decimal::new(300, 0));
}

#[tokio::test]
async fn test_cancel_pending_ticket_releases_reserved_seats() {
    let fx = fixture(Setup { seats: 2, ..Default::default() }).await;
    let created = fx.workflow.add(fx.request(&["Leo", "Mia"])).await.unwrap();
    assert_eq!(fx.stored_train().await.available_seats, 0);

    fx.workflow
        .cancel_ticket(created.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(fx.stored_train().await.available_seats, 2);
    // The freed seats can be booked again
    fx.workflow.add(fx.request(&["Noor", "Omar"])).await.unwrap();
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_the_booking() {
    let fx = fixture(Setup { notifier: RecordingSender::failing(), ..Default::default() }).await;

    let view = fx.workflow.add(fx.request(&["Sana"])).await.unwrap();

    assert_eq!(fx.ticket_count().await, 1);
    assert_eq!(fx.notifier.subjects(), vec![SUBJECT_BOOKING]);
    assert!(fx.workflow.get_by_id(view.ticket_id).await.is_ok());
}

#[tokio::test]
async fn test_notification_carries_rendered_ticket() {
    let fx = fixture(Setup::default()).await;
    let view = fx.workflow.add(fx.request(&["Vikram"])).await.unwrap();

    let sent = fx.notifier.sent.lock().unwrap();
    let notification = &sent[0];
    assert_eq!(notification.recipient.expose(), "priya@rail.example");
    assert_eq!(notification.event.ticket_id, view.ticket_id);
    assert!(notification.body.contains("Mumbai Central"));
    assert!(notification.body.contains("New Delhi"));
    assert!(notification.body.contains("20-12-2026"));
    assert!(notification.body.contains("<strong>Seat:</strong> A1"));
}

#[tokio::test]
async fn test_deferred_charge_debits_on_approval() {
    let policy = BookingPolicy { charge_at_booking: false, ..Default::default() };
    let fx = fixture(Setup { fare: 100, balance: 250, policy, ..Default::default() }).await;

    let created = fx.workflow.add(fx.request(&["Anya", "Dev"])).await.unwrap();
    assert_eq!(created.payment_status, PaymentStatus::Unpaid);
    assert_eq!(fx.balance().await, Decimal::new(250, 0));

    let approved = fx
        .workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();
    assert_eq!(approved.payment_status, PaymentStatus::Paid);
    assert_eq!(fx.balance().await, Decimal::new(50, 0));
}

#[tokio::test]
async fn test_cancel_unpaid_ticket_makes_no_refund() {
    let policy = BookingPolicy { charge_at_booking: false, ..Default::default() };
    let fx = fixture(Setup { balance: 250, policy, ..Default::default() }).await;
    let created = fx.workflow.add(fx.request(&["Anya"])).await.unwrap();

    let cancelled = fx
        .workflow
        .cancel_ticket(created.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.payment_status, PaymentStatus::Unpaid);
    assert_eq!(fx.balance().await, Decimal::new(250, 0));
}

#[tokio::test]
async fn test_unknown_records_are_not_found() {
    let fx = fixture(Setup::default()).await;

    let mut request = fx.request(&["Ghost"]);
    request.train_id = Uuid::new_v4();
    assert!(matches!(
        fx.workflow.add(request).await,
        Err(BookingError::NotFound { entity: "train", .. })
    ));

    let mut request = fx.request(&["Ghost"]);
    request.user_id = Uuid::new_v4();
    assert!(matches!(
        fx.workflow.add(request).await,
        Err(BookingError::NotFound { entity: "user", .. })
    ));

    let mut request = fx.request(&["Ghost"]);
    request.destination_station_id = Uuid::new_v4();
    assert!(matches!(
        fx.workflow.add(request).await,
        Err(BookingError::NotFound { entity: "station", .. })
    ));

    let missing = Uuid::new_v4();
    for result in [
        fx.workflow.approve_ticket(missing, TicketStatus::Booked).await,
        fx.workflow.cancel_ticket(missing, TicketStatus::Cancelled).await,
        fx.workflow.get_by_id(missing).await,
        fx.workflow.delete(missing).await,
    ] {
        assert!(matches!(result, Err(BookingError::NotFound { entity: "ticket", .. })));
    }
}

#[tokio::test]
async fn test_reused_passenger_id_is_rejected() {
    let fx = fixture(Setup::default()).await;
    let created = fx.workflow.add(fx.request(&["Rhea"])).await.unwrap();

    let mut request = fx.request(&["Rhea"]);
    request.passengers[0].id = Some(created.passengers[0].id);
    assert!(matches!(
        fx.workflow.add(request).await,
        Err(BookingError::Validation(_))
    ));
}

#[tokio::test]
async fn test_update_journey_only_while_pending() {
    let fx = fixture(Setup::default()).await;
    let created = fx.workflow.add(fx.request(&["Jai"])).await.unwrap();
    let new_date = chrono::NaiveDate::from_ymd_opt(2027, 1, 2).unwrap();

    let updated = fx
        .workflow
        .update_journey(
            created.ticket_id,
            JourneyChange { journey_date: Some(new_date), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(updated.journey_date, new_date);
    assert_eq!(fx.notifier.subjects().last().unwrap(), SUBJECT_UPDATE);

    // Swapping to identical stations is refused
    let err = fx
        .workflow
        .update_journey(
            created.ticket_id,
            JourneyChange { source_station_id: Some(fx.destination.id), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    fx.workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();
    let err = fx
        .workflow
        .update_journey(
            created.ticket_id,
            JourneyChange { journey_date: Some(new_date), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_delete_frees_seats_without_refund() {
    let fx = fixture(Setup { seats: 3, fare: 100, balance: 500, ..Default::default() }).await;
    let created = fx.workflow.add(fx.request(&["Uma", "Vir"])).await.unwrap();
    fx.workflow
        .approve_ticket(created.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();

    let deleted = fx.workflow.delete(created.ticket_id).await.unwrap();

    assert_eq!(deleted.ticket_id, created.ticket_id);
    assert_eq!(deleted.seat_numbers(), vec!["A1", "A2"]);
    assert_eq!(fx.stored_train().await.available_seats, 3);
    assert_eq!(fx.ticket_count().await, 0);
    assert_eq!(fx.balance().await, Decimal::new(300, 0));
}

#[tokio::test]
async fn test_listing_filters_by_status_train_and_user() {
    let fx = fixture(Setup::default()).await;
    let pending = fx.workflow.add(fx.request(&["P"])).await.unwrap();
    let booked = fx.workflow.add(fx.request(&["B"])).await.unwrap();
    let cancelled = fx.workflow.add(fx.request(&["C"])).await.unwrap();
    fx.workflow
        .approve_ticket(booked.ticket_id, TicketStatus::Booked)
        .await
        .unwrap();
    fx.workflow
        .cancel_ticket(cancelled.ticket_id, TicketStatus::Cancelled)
        .await
        .unwrap();

    let ids = |views: Vec<rail_booking::TicketView>| -> Vec<Uuid> {
        views.into_iter().map(|v| v.ticket_id).collect()
    };

    assert_eq!(fx.workflow.get_all().await.unwrap().len(), 3);
    assert_eq!(ids(fx.workflow.pending_tickets().await.unwrap()), vec![pending.ticket_id]);
    assert_eq!(
        ids(fx.workflow.booked_tickets(fx.train.id).await.unwrap()),
        vec![booked.ticket_id]
    );
    assert_eq!(
        ids(fx.workflow.booked_tickets_by_user(fx.user.id).await.unwrap()),
        vec![booked.ticket_id]
    );
    assert_eq!(
        ids(fx.workflow.cancelled_tickets_by_user(fx.user.id).await.unwrap()),
        vec![cancelled.ticket_id]
    );

    assert!(matches!(
        fx.workflow.booked_tickets(Uuid::new_v4()).await,
        Err(BookingError::NotFound { entity: "train", .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_never_share_a_seat() {
    let fx = Arc::new(fixture(Setup { seats: 5, fare: 10, balance: 1000, ..Default::default() }).await);

    let mut handles = Vec::new();
    for i in 0..12 {
        let fx = fx.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("Rider {}", i);
            fx.workflow.add(fx.request(&[name.as_str()])).await
        }));
    }

    let mut booked = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(BookingError::InsufficientSeats { .. }) => short += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(booked, 5);
    assert_eq!(short, 7);

    let train = fx.stored_train().await;
    assert_eq!(train.available_seats, 0);
    let holders: HashSet<_> = train.seats.iter().filter_map(|s| s.passenger_id).collect();
    assert_eq!(holders.len(), 5);
    assert_eq!(fx.balance().await, Decimal::new(950, 0));
}
