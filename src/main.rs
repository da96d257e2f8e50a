use anyhow::Context;
use chrono::{Duration as TimeDelta, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use tokio::task;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_core::{
    config::Config,
    models::{Money, SeatType},
    services::cleanup::ExpirySweeper,
    AppState, Error,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cinema booking core demo");

    let state = AppState::new(config);

    // Background task sweeping lapsed holds
    let sweeper_state = state.clone();
    task::spawn(async move {
        ExpirySweeper::new(sweeper_state).run().await;
    });

    // --- Seed the catalog ---

    let cinema = state
        .store
        .add_cinema(
            "Grand Lumiere",
            HashMap::from([(SeatType::SuperVip, 120)]),
        )
        .await?;
    let film_a = state.store.add_film("Interstellar").await?;
    let film_b = state.store.add_film("The Great Escape").await?;

    let mut layout = Vec::new();
    for n in 1..=4 {
        layout.push((SeatType::Ordinary, format!("A{n}")));
    }
    for n in 1..=2 {
        layout.push((SeatType::Vip, format!("B{n}")));
    }
    layout.push((SeatType::Couple, "C1".to_string()));
    layout.push((SeatType::SuperVip, "C2".to_string()));
    let showroom = state
        .store
        .add_showroom(cinema.id, "Screen 1", layout)
        .await?;
    info!(cinema = %cinema.name, showroom = %showroom.name, "catalog seeded");

    // --- Schedule screenings ---

    let base = Utc::now() + TimeDelta::days(1);
    let evening = state
        .scheduler
        .schedule_showtime(
            film_a.id,
            showroom.id,
            base,
            base + TimeDelta::hours(2),
            Money::from_minor(1000),
        )
        .await?;
    // Back-to-back is allowed
    state
        .scheduler
        .schedule_showtime(
            film_b.id,
            showroom.id,
            base + TimeDelta::hours(2),
            base + TimeDelta::hours(4),
            Money::from_minor(1200),
        )
        .await?;
    // An overlapping slot is not
    match state
        .scheduler
        .schedule_showtime(
            film_b.id,
            showroom.id,
            base + TimeDelta::hours(1),
            base + TimeDelta::hours(3),
            Money::from_minor(1200),
        )
        .await
    {
        Err(Error::Conflict { existing, .. }) => {
            warn!(existing, "overlapping slot rejected as expected")
        }
        other => anyhow::bail!("expected a scheduling conflict, got {other:?}"),
    }

    // --- Concurrent booking burst on one vip seat ---

    let seats = state.store.seats_in_showroom(showroom.id).await?;
    let vip = seats
        .iter()
        .find(|s| s.seat_type == SeatType::Vip)
        .context("no vip seat in layout")?;

    let attempts = join_all((0..4).map(|_| {
        let engine = state.reservations.clone();
        let showtime_id = evening.id;
        let seat_id = vip.id;
        async move { engine.reserve_seats(showtime_id, &[seat_id]).await }
    }))
    .await;
    let winners: Vec<_> = attempts.into_iter().filter_map(|r| r.ok()).collect();
    info!(
        winners = winners.len(),
        "burst finished, exactly one hold expected"
    );

    let held = winners.first().context("no attempt won the burst")?;
    let confirmed = state
        .reservations
        .confirm_reservation(&held.iter().map(|t| t.id).collect::<Vec<_>>())
        .await?;
    for ticket in &confirmed {
        info!(
            seat = %ticket.seat_position,
            price = %ticket.price,
            "ticket confirmed"
        );
    }
    // The payload an API layer would hand back to the customer
    info!(payload = %serde_json::to_string(&confirmed)?, "confirmation payload");

    let vip_price = state
        .pricing
        .compute_price(evening.id, SeatType::Vip)
        .await?;
    info!(base = %evening.base_price, vip = %vip_price, "pricing check");

    for film in state.store.list_films().await? {
        for show in state.store.showtimes_for_film(film.id).await? {
            info!(film = %film.title, showtime_id = show.id, start = %show.start_at, "listing");
        }
    }
    for (show, free) in state.reservations.showtimes_with_availability().await? {
        info!(showtime_id = show.id, free, "availability");
    }

    let stats = ExpirySweeper::new(state.clone()).stats().await;
    info!(live = stats.live_holds, due = stats.due_holds, "hold stats");

    Ok(())
}
