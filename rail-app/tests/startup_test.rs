use rail_app::{startup::run_startup_checks, state::AppState};
use rail_booking::{NewStation, NewTrain};
use rail_core::repository::TrainRepository;
use rail_core::ticket::{NewPassenger, NewTicket};
use rail_core::{BookingPolicy, Route, User};
use rust_decimal::Decimal;

#[tokio::test]
async fn test_startup_checks_on_in_memory_state() {
    let (state, store) = AppState::in_memory(BookingPolicy::default());

    let origin = state
        .stations
        .add_station(NewStation {
            name: "Howrah".to_string(),
            code: "HWH".to_string(),
            pincode: "711101".to_string(),
        })
        .await
        .unwrap();
    let terminus = state
        .stations
        .add_station(NewStation {
            name: "Puri".to_string(),
            code: "PURI".to_string(),
            pincode: "752001".to_string(),
        })
        .await
        .unwrap();
    let train = state
        .trains
        .add_train(NewTrain {
            name: "Jagannath Express".to_string(),
            number: "18409".to_string(),
            total_seats: 6,
            fare: Decimal::new(80, 0),
            route: Route {
                source_station_id: origin.id,
                destination_station_id: terminus.id,
                intermediate_station_ids: vec![],
                distance_km: 500,
                duration_minutes: 600,
            },
        })
        .await
        .unwrap();

    let user = User::new("sourav", "sourav@rail.example", "9000000020", Decimal::new(400, 0));
    store.insert_user(user.clone()).await;

    state
        .workflow
        .add(NewTicket {
            train_id: train.id,
            user_id: user.id,
            source_station_id: origin.id,
            destination_station_id: terminus.id,
            journey_date: chrono::NaiveDate::from_ymd_opt(2026, 11, 30).unwrap(),
            passengers: vec![NewPassenger {
                id: None,
                name: "Sourav".to_string(),
                age: 38,
                gender: None,
            }],
        })
        .await
        .unwrap();

    // Knock the counter out of sync
    let mut stored = TrainRepository::get(store.as_ref(), train.id).await.unwrap().unwrap();
    stored.available_seats = 6;
    TrainRepository::update(store.as_ref(), &stored).await.unwrap();

    let report = run_startup_checks(&state).await.unwrap();

    assert_eq!(report.trains, 1);
    assert_eq!(report.pending_tickets, 1);
    assert_eq!(report.corrected_trains, vec![train.id]);

    let repaired = TrainRepository::get(store.as_ref(), train.id).await.unwrap().unwrap();
    assert_eq!(repaired.available_seats, 5);
}
