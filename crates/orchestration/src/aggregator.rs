//! Concurrent fan-out over independent service calls.
//!
//! An [`AggregateRequest`] names a set of independent sub-requests. Each one
//! resolves its target through the directory on its own and runs as a
//! separate task. The aggregate waits for every task, never cancelling the
//! rest when one fails, and yields either all results or all failures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, ErrorKind, Order, OrderId, ServiceError, ServiceLocation, User,
    UserId,
};
use discovery::{CATALOG_AUTHORITY, Directory, ORDER_SERVICE, SharedDirectory, USER_AUTHORITY};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::clients::{
    CatalogAuthority, HttpCatalogClient, HttpOrderClient, HttpUserClient, OrderAuthority,
    UserAuthority,
};

/// The remote operation a sub-request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    GetUser(UserId),
    GetCatalogItem(CatalogItemId),
    GetOrder(OrderId),
}

impl RemoteCall {
    /// The logical service that owns the record this call reads.
    pub fn default_service(&self) -> &'static str {
        match self {
            RemoteCall::GetUser(_) => USER_AUTHORITY,
            RemoteCall::GetCatalogItem(_) => CATALOG_AUTHORITY,
            RemoteCall::GetOrder(_) => ORDER_SERVICE,
        }
    }
}

/// A record returned by a sub-request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RemoteRecord {
    User(User),
    CatalogItem(CatalogItem),
    Order(Order),
}

/// One named unit of work inside an aggregate.
#[derive(Debug, Clone)]
pub struct SubRequest {
    pub name: String,
    pub service: String,
    pub call: RemoteCall,
}

impl SubRequest {
    /// Targets the service that owns the record `call` reads.
    pub fn new(name: impl Into<String>, call: RemoteCall) -> Self {
        Self {
            name: name.into(),
            service: call.default_service().to_string(),
            call,
        }
    }
}

/// Returned when an aggregate request is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateRequestError {
    #[error("aggregate request must contain at least one sub-request")]
    Empty,
    #[error("duplicate sub-request name: {0}")]
    DuplicateName(String),
}

/// A non-empty set of uniquely named sub-requests.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    subrequests: Vec<SubRequest>,
}

impl AggregateRequest {
    pub fn new(subrequests: Vec<SubRequest>) -> Result<Self, AggregateRequestError> {
        if subrequests.is_empty() {
            return Err(AggregateRequestError::Empty);
        }
        let mut seen = HashSet::with_capacity(subrequests.len());
        for sub in &subrequests {
            if !seen.insert(sub.name.as_str()) {
                return Err(AggregateRequestError::DuplicateName(sub.name.clone()));
            }
        }
        Ok(Self { subrequests })
    }

    pub fn len(&self) -> usize {
        self.subrequests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subrequests.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.subrequests.iter().map(|s| s.name.as_str())
    }
}

/// Every sub-request succeeded. Results are keyed by name in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateSuccess {
    results: IndexMap<String, RemoteRecord>,
}

impl AggregateSuccess {
    pub fn get(&self, name: &str) -> Option<&RemoteRecord> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> IndexMap<String, RemoteRecord> {
        self.results
    }
}

/// At least one sub-request failed. Every failure is kept, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFailure {
    failures: IndexMap<String, ServiceError>,
}

impl AggregateFailure {
    pub fn failures(&self) -> &IndexMap<String, ServiceError> {
        &self.failures
    }

    /// The most severe kind among the failures.
    pub fn kind(&self) -> ErrorKind {
        self.failures
            .values()
            .map(|e| e.kind)
            .max()
            .unwrap_or(ErrorKind::Internal)
    }
}

impl std::fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("could not retrieve all data")?;
        for (name, error) in &self.failures {
            write!(f, " - {name} error: {}", error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

impl From<AggregateFailure> for ServiceError {
    fn from(failure: AggregateFailure) -> Self {
        ServiceError::new(failure.kind(), failure.to_string())
    }
}

/// Outcome of one aggregate execution.
pub type AggregateResult = Result<AggregateSuccess, AggregateFailure>;

/// A user together with a catalog item, both fetched in one aggregate read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAndItem {
    pub user: User,
    pub item: CatalogItem,
}

/// Performs a [`RemoteCall`] against a resolved instance.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        location: &ServiceLocation,
        call: &RemoteCall,
    ) -> Result<RemoteRecord, ServiceError>;
}

/// Invokes calls over HTTP using the typed clients.
#[derive(Clone, Default)]
pub struct HttpInvoker {
    client: reqwest::Client,
}

impl HttpInvoker {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(
        &self,
        location: &ServiceLocation,
        call: &RemoteCall,
    ) -> Result<RemoteRecord, ServiceError> {
        match *call {
            RemoteCall::GetUser(id) => HttpUserClient::new(self.client.clone(), location.clone())
                .get_user(id)
                .await
                .map(RemoteRecord::User),
            RemoteCall::GetCatalogItem(id) => {
                HttpCatalogClient::new(self.client.clone(), location.clone())
                    .get_item(id)
                    .await
                    .map(RemoteRecord::CatalogItem)
            }
            RemoteCall::GetOrder(id) => HttpOrderClient::new(self.client.clone(), location.clone())
                .get_order(id)
                .await
                .map(RemoteRecord::Order),
        }
    }
}

/// Runs aggregate requests against discovered services.
#[derive(Clone)]
pub struct FanOutAggregator {
    directory: SharedDirectory,
    invoker: Arc<dyn Invoker>,
    deadline: Option<Duration>,
}

impl FanOutAggregator {
    pub fn new(directory: SharedDirectory, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            directory,
            invoker,
            deadline: None,
        }
    }

    /// Bounds each sub-request. One that overruns fails as `Unavailable`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Executes every sub-request concurrently and waits for all of them.
    #[tracing::instrument(skip(self, request), fields(subrequests = request.len()))]
    pub async fn execute(&self, request: AggregateRequest) -> AggregateResult {
        metrics::counter!("aggregate_requests_total").increment(1);
        let started = Instant::now();

        let names: Vec<String> = request.names().map(str::to_string).collect();
        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::with_capacity(names.len());

        for (index, sub) in request.subrequests.into_iter().enumerate() {
            let directory = Arc::clone(&self.directory);
            let invoker = Arc::clone(&self.invoker);
            let deadline = self.deadline;
            let handle = join_set.spawn(async move {
                let outcome =
                    run_subrequest(directory.as_ref(), invoker.as_ref(), &sub, deadline).await;
                (index, outcome)
            });
            task_index.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<Result<RemoteRecord, ServiceError>>> =
            (0..names.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, (index, outcome))) => {
                    task_index.remove(&id);
                    outcomes[index] = Some(outcome);
                }
                Err(e) => {
                    let Some(index) = task_index.remove(&e.id()) else {
                        tracing::error!(error = %e, "untracked sub-request task failed");
                        continue;
                    };
                    tracing::error!(subrequest = %names[index], error = %e, "sub-request task failed");
                    outcomes[index] = Some(Err(ServiceError::internal(format!(
                        "sub-request task failed: {e}"
                    ))));
                }
            }
        }

        let mut results = IndexMap::with_capacity(names.len());
        let mut failures = IndexMap::new();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Some(Ok(record)) => {
                    results.insert(name, record);
                }
                Some(Err(e)) => {
                    failures.insert(name, e);
                }
                None => {
                    failures.insert(name, ServiceError::internal("sub-request produced no result"));
                }
            }
        }

        metrics::histogram!("aggregate_duration_seconds").record(started.elapsed().as_secs_f64());

        if failures.is_empty() {
            Ok(AggregateSuccess { results })
        } else {
            metrics::counter!("aggregate_failures_total").increment(1);
            let failure = AggregateFailure { failures };
            tracing::warn!(kind = %failure.kind(), error = %failure, "aggregate request failed");
            Err(failure)
        }
    }

    /// Fetches a user and a catalog item concurrently.
    pub async fn user_and_item(
        &self,
        user_id: UserId,
        item_id: CatalogItemId,
    ) -> Result<UserAndItem, AggregateFailure> {
        let request = AggregateRequest {
            subrequests: vec![
                SubRequest::new("user", RemoteCall::GetUser(user_id)),
                SubRequest::new("item", RemoteCall::GetCatalogItem(item_id)),
            ],
        };
        let mut results = self.execute(request).await?.into_results();

        match (results.swap_remove("user"), results.swap_remove("item")) {
            (Some(RemoteRecord::User(user)), Some(RemoteRecord::CatalogItem(item))) => {
                Ok(UserAndItem { user, item })
            }
            _ => Err(AggregateFailure {
                failures: IndexMap::from([(
                    "aggregate".to_string(),
                    ServiceError::internal("unexpected record type in aggregate result"),
                )]),
            }),
        }
    }
}

async fn run_subrequest(
    directory: &dyn Directory,
    invoker: &dyn Invoker,
    sub: &SubRequest,
    deadline: Option<Duration>,
) -> Result<RemoteRecord, ServiceError> {
    let call = async {
        let location = directory
            .resolve(&sub.service)
            .await
            .map_err(ServiceError::from)?;
        invoker.invoke(&location, &sub.call).await
    };

    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(ServiceError::unavailable(format!(
                "deadline exceeded calling {}",
                sub.service
            )))
        }),
        None => call.await,
    };

    if let Err(e) = &result {
        tracing::warn!(subrequest = %sub.name, service = %sub.service, kind = %e.kind, error = %e.message, "sub-request failed");
    }
    result
}
