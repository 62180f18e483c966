//! A routing service stand-in that replays scripted replies.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trip_planner::polyline::Polyline;
use trip_planner::traits::RouteProvider;
use trip_planner::{Coordinate, RouteQuery, RouteResult, RoutingError};

#[derive(Debug, Clone)]
pub enum Reply {
    Route(RouteResult),
    Fail,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub reply: Reply,
}

impl Step {
    pub fn route(delay_ms: u64, result: RouteResult) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Reply::Route(result),
        }
    }

    pub fn fail(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Reply::Fail,
        }
    }
}

/// Records every query and answers them with the next scripted step.
/// Once the script runs out every call fails with `NoRoute`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRouter {
    calls: Arc<Mutex<Vec<RouteQuery>>>,
    script: Arc<Mutex<VecDeque<Step>>>,
}

impl ScriptedRouter {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            calls: Arc::default(),
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
        }
    }

    pub fn calls(&self) -> Vec<RouteQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl RouteProvider for ScriptedRouter {
    fn compute_route(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<RouteResult, RoutingError>> + Send {
        self.calls.lock().unwrap().push(query.clone());
        let step = self.script.lock().unwrap().pop_front();

        async move {
            let Some(step) = step else {
                return Err(RoutingError::NoRoute);
            };
            tokio::time::sleep(step.delay).await;
            match step.reply {
                Reply::Route(result) => Ok(result),
                Reply::Fail => Err(RoutingError::Payload("scripted failure".to_string())),
            }
        }
    }
}

/// A route tagged by its distance so tests can tell replies apart.
pub fn tagged_route(distance_meters: f64, optimized_order: Option<Vec<usize>>) -> RouteResult {
    RouteResult {
        path: Polyline::new(vec![
            Coordinate::new(41.8058, -6.7572),
            Coordinate::new(41.8069, -6.7547),
        ]),
        optimized_order,
        distance_meters: Some(distance_meters),
        duration_seconds: Some(600.0),
        distance_text: Some(format!("{} m", distance_meters)),
        duration_text: Some("10 min".to_string()),
    }
}
