use commute_signal::animation::AnimationEngine;
use commute_signal::api;
use commute_signal::clock::{MonotonicClock, SystemClock};
use commute_signal::config::{self, LedDriver, TransportMode};
use commute_signal::display::{LogDisplay, STANDBY_BANNER, TextDisplay};
use commute_signal::error::AppError;
use commute_signal::led::ws2812::Ws2812Spi;
use commute_signal::led::{LogSink, PixelSink};
use commute_signal::link::http::{HttpTransport, spawn_link_monitor};
use commute_signal::link::loopback::LoopbackTransport;
use commute_signal::link::{RequestScheduler, Transport};
use commute_signal::response::{INBOUND_QUEUE_DEPTH, run_response_task};
use commute_signal::signal::Telemetry;
use commute_signal::state::{AppState, EngineConfig};
use commute_signal::tick::{TickLoop, startup_fill};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_from_path(&config_path)?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = %config_path,
        app = %config.app.name,
        "commute-signal starting"
    );

    let mut display = LogDisplay;
    display.show_banner(STANDBY_BANNER)?;

    let mut rng = StdRng::from_os_rng();
    let mut sink = build_sink(&config);
    if let Err(err) = startup_fill(&mut sink, config.pixel_count(), config.brightness(), &mut rng) {
        tracing::warn!(error = %err, "Startup fill failed");
    }

    let wall_clock = SystemClock::new(config.timezone_offset_hours())?;
    let state = Arc::new(RwLock::new(AppState::new(
        config.initial_schedule(),
        Telemetry::awaiting(config.route_description()),
        EngineConfig {
            pixel_brightness: config.brightness(),
            logic_call_interval_ms: config.logic_call_interval_ms(),
        },
    )));
    let signal = state
        .read()
        .map_err(|_| AppError::StateLock)?
        .subscribe_signal();

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
    let stop_flag = Arc::new(AtomicBool::new(false));
    let transport = build_transport(&config, inbound_tx.clone(), &stop_flag);

    let _response_handle = tokio::spawn(run_response_task(
        inbound_rx,
        Arc::clone(&state),
        wall_clock,
        display,
    ));

    let monotonic = MonotonicClock::new();
    let now_ms = monotonic.millis();
    let engine = AnimationEngine::new(
        config.pixel_count(),
        config.frame_interval_ms(),
        config.palette(),
        now_ms,
        &mut rng,
    );
    let scheduler = RequestScheduler::with_warmup(
        now_ms,
        config.logic_call_interval_ms(),
        config.warmup_ms(),
    );
    let tick_loop = TickLoop::new(
        engine,
        scheduler,
        sink,
        transport,
        wall_clock,
        signal,
        config.route_coordinates(),
        rng,
    );
    let _tick_handle = tokio::spawn(tick_loop.run(
        config.tick_interval(),
        monotonic,
        Arc::clone(&stop_flag),
    ));

    let app = api::router(Arc::clone(&state), inbound_tx);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    // Signal tick loop and link monitor to stop
    stop_flag.store(true, Ordering::Relaxed);

    Ok(())
}

fn build_sink(config: &config::Config) -> Box<dyn PixelSink + Send> {
    let pixel_count = config.pixel_count();
    match config.led_driver() {
        LedDriver::Log => {
            tracing::info!(pixel_count, "Using log LED sink");
            Box::new(LogSink::new(pixel_count))
        }
        LedDriver::Ws2812 => match Ws2812Spi::new(pixel_count, config.spi_clock_hz()) {
            Ok(strip) => {
                tracing::info!(
                    pixel_count,
                    clock_hz = config.spi_clock_hz(),
                    "WS2812 strip ready on SPI0"
                );
                Box::new(strip)
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to open WS2812 strip, using log sink");
                Box::new(LogSink::new(pixel_count))
            }
        },
    }
}

fn build_transport(
    config: &config::Config,
    inbound: mpsc::Sender<String>,
    stop: &Arc<AtomicBool>,
) -> Box<dyn Transport> {
    match (config.transport_mode(), config.transport_endpoint()) {
        (TransportMode::Http, Some(endpoint)) => {
            let connected = Arc::new(AtomicBool::new(false));
            tracing::info!(
                endpoint,
                probe_interval_ms = config.probe_interval().as_millis(),
                "Starting link monitor"
            );
            let _monitor = spawn_link_monitor(
                endpoint.to_string(),
                config.probe_interval(),
                config.transport_timeout(),
                Arc::clone(&connected),
                Arc::clone(stop),
            );
            Box::new(HttpTransport::new(
                endpoint.to_string(),
                config.transport_timeout(),
                connected,
                inbound,
                Handle::current(),
            ))
        }
        (TransportMode::Http, None) => {
            tracing::warn!("No transport endpoint configured, answering requests locally");
            Box::new(LoopbackTransport::new(config.planner(), inbound))
        }
        (TransportMode::Loopback, _) => {
            tracing::info!("Answering route requests with the local planner");
            Box::new(LoopbackTransport::new(config.planner(), inbound))
        }
    }
}
