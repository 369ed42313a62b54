//! Async I/O pump for the tree engine

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::time::Instant;
use tokio::time::sleep_until;

use crate::engine::ServiceCall;
use crate::engine::ServiceReply;
use crate::engine::TreeEngine;
use crate::model::SkelType;
use crate::service::RemoteTreeService;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Performs the engine's service calls and feeds the replies back.
///
/// Calls run concurrently and complete in any order; the engine sorts out
/// which replies are still wanted.
///
/// # Example
///
/// ```ignore
/// let mut driver = TreeDriver::new(TreeEngine::new(config), Arc::new(service));
/// driver.run_until_idle().await;
///
/// driver.engine_mut().toggle_expand("n1");
/// driver.run_until_idle().await;
/// ```
pub struct TreeDriver {
    engine: TreeEngine,
    service: Arc<dyn RemoteTreeService>,
    in_flight: FuturesUnordered<BoxFuture<ServiceReply>>,
}

impl TreeDriver {
    pub fn new(engine: TreeEngine, service: Arc<dyn RemoteTreeService>) -> Self {
        Self {
            engine,
            service,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn engine(&self) -> &TreeEngine {
        &self.engine
    }

    /// Mutable access for user operations; the queued calls are picked up
    /// by the next [`step`](Self::step) or [`run_until_idle`](Self::run_until_idle).
    pub fn engine_mut(&mut self) -> &mut TreeEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> TreeEngine {
        self.engine
    }

    /// Number of calls currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Starts every queued call.
    pub fn pump(&mut self) {
        for call in self.engine.take_calls() {
            let future = self.start(call);
            self.in_flight.push(future);
        }
    }

    /// Runs until no call is queued or in flight.
    pub async fn run_until_idle(&mut self) {
        loop {
            self.pump();
            match self.in_flight.next().await {
                Some(reply) => self.engine.deliver(reply),
                None => break,
            }
        }
    }

    /// Waits for the next reply or drag-leave deadline and applies it.
    ///
    /// Returns `false` when there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        self.pump();
        let deadline = self.engine.next_drag_deadline();
        if self.in_flight.is_empty() && deadline.is_none() {
            return false;
        }

        tokio::select! {
            Some(reply) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                self.engine.deliver(reply);
            }
            _ = sleep_until_optional(deadline) => {
                self.engine.poll_drag(Instant::now());
            }
        }
        true
    }

    /// Waits out the pending drag-leave clear, if any.
    ///
    /// Returns `true` if the drop classification was cleared.
    pub async fn settle_drag(&mut self) -> bool {
        while let Some(deadline) = self.engine.next_drag_deadline() {
            sleep_until(deadline).await;
            if self.engine.poll_drag(Instant::now()) {
                return true;
            }
        }
        false
    }

    fn start(&self, call: ServiceCall) -> BoxFuture<ServiceReply> {
        let service = Arc::clone(&self.service);
        let module = self.engine.module().to_string();

        match call {
            ServiceCall::List { id, kind, params } => Box::pin(async move {
                let result = service.list(&module, kind, &params).await;
                ServiceReply::List { id, result }
            }),
            ServiceCall::ListRootNodes { generation, context } => Box::pin(async move {
                let result = service.list_root_nodes(&module, &context).await;
                ServiceReply::RootNodes { generation, result }
            }),
            ServiceCall::View { generation, key } => Box::pin(async move {
                let result = service.view(&module, SkelType::Node, &key).await;
                ServiceReply::View { generation, result }
            }),
            ServiceCall::Move(request) => Box::pin(async move {
                let result = service.move_entry(&module, &request).await;
                ServiceReply::Moved {
                    key: request.key,
                    result,
                }
            }),
        }
    }
}

async fn sleep_until_optional(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
