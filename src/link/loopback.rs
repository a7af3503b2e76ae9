use crate::error::AppError;
use crate::link::planner::RoutePlanner;
use crate::link::{RouteRequest, Transport};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Answers each request locally with planner output, no network involved.
///
/// Replies carry hardware parameters only; travel times stay as they were.
#[derive(Debug)]
pub struct LoopbackTransport {
    planner: RoutePlanner,
    inbound: mpsc::Sender<String>,
}

impl LoopbackTransport {
    pub fn new(planner: RoutePlanner, inbound: mpsc::Sender<String>) -> Self {
        Self { planner, inbound }
    }
}

impl Transport for LoopbackTransport {
    fn is_connected(&self) -> bool {
        !self.inbound.is_closed()
    }

    fn publish(&mut self, request: &RouteRequest) -> Result<(), AppError> {
        request.to_payload()?;
        let params = self.planner.plan(request.weekday, request.hour);
        debug!(route = %params.route_description, "Loopback plan");
        let reply = serde_json::to_string(&params)?;
        self.inbound.try_send(reply).map_err(|err| match err {
            TrySendError::Closed(_) => AppError::InboundClosed,
            TrySendError::Full(_) => AppError::Transport("inbound queue full".to_string()),
        })
    }
}
