#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rail_booking::{BookingLocks, NewStation, NewTrain, StationService, TicketWorkflow, TrainService};
use rail_core::notification::{Notification, NotificationSender};
use rail_core::repository::Persistence;
use rail_core::ticket::{NewPassenger, NewTicket};
use rail_core::{BookingPolicy, Route, Station, Train, User};
use rail_store::MemoryStore;
use rust_decimal::Decimal;

/// Keeps every notification, optionally failing each send after recording it.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.subject.clone()).collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, notification: &Notification) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err("smtp relay unavailable".into());
        }
        Ok(())
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub persistence: Persistence,
    pub locks: Arc<BookingLocks>,
    pub notifier: Arc<RecordingSender>,
    pub workflow: TicketWorkflow,
    pub trains: TrainService,
    pub train: Train,
    pub user: User,
    pub source: Station,
    pub destination: Station,
}

pub struct Setup {
    pub seats: i32,
    pub fare: i64,
    pub balance: i64,
    pub policy: BookingPolicy,
    pub notifier: RecordingSender,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            seats: 10,
            fare: 100,
            balance: 1000,
            policy: BookingPolicy::default(),
            notifier: RecordingSender::default(),
        }
    }
}

pub async fn fixture(setup: Setup) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let persistence = store.persistence();
    let locks = Arc::new(BookingLocks::new());
    let notifier = Arc::new(setup.notifier);

    let stations = StationService::new(persistence.clone());
    let source = stations
        .add_station(NewStation {
            name: "Mumbai Central".to_string(),
            code: "MMCT".to_string(),
            pincode: "400008".to_string(),
        })
        .await
        .unwrap();
    let destination = stations
        .add_station(NewStation {
            name: "New Delhi".to_string(),
            code: "NDLS".to_string(),
            pincode: "110001".to_string(),
        })
        .await
        .unwrap();

    let trains = TrainService::new(persistence.clone(), locks.clone(), setup.policy.seat_ordering);
    let train = trains
        .add_train(NewTrain {
            name: "Rajdhani Express".to_string(),
            number: "12951".to_string(),
            total_seats: setup.seats,
            fare: Decimal::new(setup.fare, 0),
            route: Route {
                source_station_id: source.id,
                destination_station_id: destination.id,
                intermediate_station_ids: vec![],
                distance_km: 1386,
                duration_minutes: 950,
            },
        })
        .await
        .unwrap();

    let user = User::new(
        "priya",
        "priya@rail.example",
        "9000000010",
        Decimal::new(setup.balance, 0),
    );
    store.insert_user(user.clone()).await;

    let workflow = TicketWorkflow::new(persistence.clone(), notifier.clone(), locks.clone(), setup.policy);

    Fixture {
        store,
        persistence,
        locks,
        notifier,
        workflow,
        trains,
        train,
        user,
        source,
        destination,
    }
}

impl Fixture {
    pub fn request(&self, names: &[&str]) -> NewTicket {
        NewTicket {
            train_id: self.train.id,
            user_id: self.user.id,
            source_station_id: self.source.id,
            destination_station_id: self.destination.id,
            journey_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
            passengers: names
                .iter()
                .enumerate()
                .map(|(i, name)| NewPassenger {
                    id: None,
                    name: name.to_string(),
                    age: 20 + i as i32,
                    gender: None,
                })
                .collect(),
        }
    }

    pub async fn balance(&self) -> Decimal {
        self.persistence
            .users
            .get(self.user.id)
            .await
            .unwrap()
            .unwrap()
            .wallet_balance
    }

    pub async fn stored_train(&self) -> Train {
        self.persistence.trains.get(self.train.id).await.unwrap().unwrap()
    }

    pub async fn ticket_count(&self) -> usize {
        self.persistence
            .tickets
            .list(Default::default())
            .await
            .unwrap()
            .len()
    }
}
