//! Trip coordinator.
//!
//! A single actor task owns the [`TripState`]. Handle calls send mutations
//! over a channel; every effective mutation, and every origin, destination or
//! mode assignment, re-arms one debounce timer. Only when the timer fires is a
//! routing request dispatched.
//!
//! Each dispatch takes the next value of a sequence counter. Routing calls run
//! concurrently in their own tasks and report back tagged with that value; an
//! outcome is folded only if its tag is still the latest issued. Superseded
//! calls are never cancelled, their results are dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::error::{RoutingError, TripError};
use crate::model::{Coordinate, RouteResult, TravelMode, TripState, Waypoint};
use crate::traits::{LocationProvider, RouteProvider};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Quiet period after the last mutation before a route is requested.
    pub debounce: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(120),
        }
    }
}

#[derive(Debug)]
enum Mutation {
    SetOrigin(Coordinate),
    SetDestination(Waypoint),
    ClearDestination,
    AddStop(Waypoint),
    RemoveStop(String),
    SetMode(TravelMode),
}

impl Mutation {
    fn apply(self, state: &mut TripState) -> bool {
        match self {
            Mutation::SetOrigin(origin) => state.set_origin(origin),
            Mutation::SetDestination(destination) => state.set_destination(destination),
            Mutation::ClearDestination => state.clear_destination(),
            Mutation::AddStop(stop) => state.add_stop(stop),
            Mutation::RemoveStop(id) => state.remove_stop(&id),
            Mutation::SetMode(mode) => state.set_mode(mode),
        }
    }

    /// Endpoint and mode assignments schedule a recomputation even when the
    /// value is unchanged, so repeating one retries a failed route.
    fn always_reschedules(&self) -> bool {
        matches!(
            self,
            Mutation::SetOrigin(_) | Mutation::SetDestination(_) | Mutation::SetMode(_)
        )
    }
}

struct Command {
    mutation: Mutation,
    ack: oneshot::Sender<bool>,
}

struct RouteOutcome {
    sequence: u64,
    stop_ids: Vec<String>,
    result: Result<RouteResult, RoutingError>,
}

/// Handle to a running trip coordinator.
///
/// Mutations resolve once the actor has applied them and report whether the
/// trip changed. Dropping the handle stops the actor.
pub struct TripCoordinator<L> {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<TripState>,
    location: L,
    task: JoinHandle<()>,
}

impl<L: LocationProvider> TripCoordinator<L> {
    /// Starts the actor on the current tokio runtime with an empty trip.
    pub fn spawn<R: RouteProvider>(router: R, location: L, config: CoordinatorConfig) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (outcomes, outcome_rx) = mpsc::unbounded_channel();
        let (published, state) = watch::channel(TripState::new());

        let planner = Planner {
            state: TripState::new(),
            router: Arc::new(router),
            sequence: 0,
            outcomes,
            published,
        };
        let task = tokio::spawn(planner.run(command_rx, outcome_rx, config.debounce));

        Self {
            commands,
            state,
            location,
            task,
        }
    }

    pub async fn set_origin(&self, origin: Coordinate) -> Result<bool, TripError> {
        self.mutate(Mutation::SetOrigin(origin)).await
    }

    /// Waits for a device fix and makes it the origin.
    ///
    /// On a location failure the origin is left as it was.
    pub async fn set_origin_from_device(&self) -> Result<Coordinate, TripError> {
        let fix = self.location.current_position().await?;
        self.mutate(Mutation::SetOrigin(fix)).await?;
        Ok(fix)
    }

    pub async fn set_destination(&self, destination: Waypoint) -> Result<bool, TripError> {
        self.mutate(Mutation::SetDestination(destination)).await
    }

    pub async fn clear_destination(&self) -> Result<bool, TripError> {
        self.mutate(Mutation::ClearDestination).await
    }

    /// Adds a stop; a no-op if a stop or the destination already has its id.
    pub async fn add_stop(&self, stop: Waypoint) -> Result<bool, TripError> {
        self.mutate(Mutation::AddStop(stop)).await
    }

    pub async fn remove_stop(&self, id: impl Into<String>) -> Result<bool, TripError> {
        self.mutate(Mutation::RemoveStop(id.into())).await
    }

    pub async fn set_mode(&self, mode: TravelMode) -> Result<bool, TripError> {
        self.mutate(Mutation::SetMode(mode)).await
    }

    /// The latest published trip.
    pub fn snapshot(&self) -> TripState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published trip.
    pub fn subscribe(&self) -> watch::Receiver<TripState> {
        self.state.clone()
    }

    /// Stops the actor and waits for it to exit. In-flight routing calls
    /// finish in the background and are ignored.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(err) = self.task.await {
            tracing::warn!("trip coordinator task failed: {}", err);
        }
    }

    async fn mutate(&self, mutation: Mutation) -> Result<bool, TripError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command { mutation, ack })
            .await
            .map_err(|_| TripError::Closed)?;
        done.await.map_err(|_| TripError::Closed)
    }
}

struct Planner<R> {
    state: TripState,
    router: Arc<R>,
    /// Sequence number of the most recent dispatch. Advanced at dispatch time.
    sequence: u64,
    outcomes: mpsc::UnboundedSender<RouteOutcome>,
    published: watch::Sender<TripState>,
}

impl<R: RouteProvider> Planner<R> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<RouteOutcome>,
        debounce: Duration,
    ) {
        let timer = time::sleep(debounce);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(Command { mutation, ack }) = command else {
                        tracing::debug!("trip coordinator shutting down");
                        break;
                    };
                    let reschedule = mutation.always_reschedules();
                    let changed = mutation.apply(&mut self.state);
                    if changed {
                        self.publish();
                    }
                    if changed || reschedule {
                        timer.as_mut().reset(Instant::now() + debounce);
                        armed = true;
                        tracing::trace!("route recomputation scheduled");
                    }
                    ack.send(changed).ok();
                }
                Some(outcome) = outcomes.recv() => self.fold(outcome),
                () = &mut timer, if armed => {
                    armed = false;
                    self.dispatch();
                }
            }
        }
    }

    fn dispatch(&mut self) {
        // Advance even when nothing is sent so results for the previous
        // configuration can no longer apply.
        self.sequence += 1;
        let sequence = self.sequence;

        let Some(query) = self.state.route_query() else {
            tracing::trace!(sequence, "origin or destination missing, not routing");
            return;
        };
        let stop_ids = self.state.stop_ids();
        let router = Arc::clone(&self.router);
        let outcomes = self.outcomes.clone();

        tracing::trace!(sequence, stops = query.stops.len(), "dispatching route request");
        tokio::spawn(async move {
            let result = router.compute_route(&query).await;
            outcomes
                .send(RouteOutcome {
                    sequence,
                    stop_ids,
                    result,
                })
                .ok();
        });
    }

    fn fold(&mut self, outcome: RouteOutcome) {
        if outcome.sequence != self.sequence {
            tracing::debug!(
                sequence = outcome.sequence,
                latest = self.sequence,
                "discarding superseded route result"
            );
            return;
        }

        match outcome.result {
            Ok(result) => {
                self.state.apply_route(result, &outcome.stop_ids);
                self.publish();
            }
            Err(err) => {
                tracing::debug!(
                    sequence = outcome.sequence,
                    "route recomputation failed, keeping previous route: {}",
                    err
                );
            }
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }
}
