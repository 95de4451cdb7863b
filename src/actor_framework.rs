use std::collections::hash_map::Entry as MapEntry;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Trait that any stored record must implement to be managed by [`ResourceActor`].
///
/// The actor owns every record of one kind and applies requests one at a time, so
/// anything done inside a hook or an action is atomic with respect to every other
/// caller of the same store.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    // --- Custom Actions ---
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    /// Domain rejection raised by hooks and actions.
    type Error: Clone + Debug + Display + Send + Sync + 'static;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and creation parameters
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> { Ok(()) }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Transport and lookup failures shared by every store, wrapping the entity's own
/// rejection type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError<E> {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("{0}")]
    Rejected(E),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

pub type EntityError<T> = FrameworkError<<T as Entity>::Error>;

/// Result of a keyed [`ResourceClient::transact`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome<R> {
    /// Every action was applied and committed, results in request order.
    Committed(Vec<R>),
    /// The idempotency key was committed earlier; nothing was applied this time.
    AlreadyCommitted,
}

/// Read-only filter evaluated inside the actor.
pub struct Filter<T>(Box<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> Filter<T> {
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }

    fn matches(&self, item: &T) -> bool {
        (self.0)(item)
    }
}

impl<T> Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T::Id, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    GetMany {
        ids: Vec<T::Id>,
        respond_to: Response<Vec<Option<T>>, T::Error>,
    },
    Find {
        filter: Filter<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Transaction {
        key: Option<String>,
        actions: Vec<(T::Id, T::Action)>,
        respond_to: Response<TransactionOutcome<T::ActionResult>, T::Error>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    name: &'static str,
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    committed_keys: HashSet<String>,
    id_fn: Box<dyn Fn(&T::CreateParams) -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    /// `id_fn` derives the key of a new record from its creation parameters.
    pub fn new(
        name: &'static str,
        buffer_size: usize,
        id_fn: impl Fn(&T::CreateParams) -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name,
            receiver,
            store: HashMap::new(),
            committed_keys: HashSet::new(),
            id_fn: Box::new(id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    pub async fn run(mut self) {
        info!(store = self.name, "ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::GetMany { ids, respond_to } => {
                    let items = ids.iter().map(|id| self.store.get(id).cloned()).collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Find { filter, respond_to } => {
                    let items = self.store.values().filter(|item| filter.matches(item)).cloned().collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item
                            .on_update(patch)
                            .map(|()| item.clone())
                            .map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item.handle_action(action).map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Transaction { key, actions, respond_to } => {
                    let _ = respond_to.send(self.transact(key, actions));
                }
            }
        }
        info!(store = self.name, "ResourceActor stopped");
    }

    fn create(&mut self, params: T::CreateParams) -> Result<T::Id, EntityError<T>> {
        let id = (self.id_fn)(&params);
        if self.store.contains_key(&id) {
            warn!(store = self.name, id = %id, "Refusing to overwrite existing item");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }
        let mut item = T::from_create_params(id.clone(), params).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        self.store.insert(id.clone(), item);
        Ok(id)
    }

    /// Applies every action to staged copies and commits them only if all succeed.
    fn transact(
        &mut self,
        key: Option<String>,
        actions: Vec<(T::Id, T::Action)>,
    ) -> Result<TransactionOutcome<T::ActionResult>, EntityError<T>> {
        if let Some(key) = &key {
            if self.committed_keys.contains(key) {
                debug!(store = self.name, key = %key, "Transaction key already committed");
                return Ok(TransactionOutcome::AlreadyCommitted);
            }
        }

        let mut staged: HashMap<T::Id, T> = HashMap::new();
        let mut results = Vec::with_capacity(actions.len());
        for (id, action) in actions {
            let item = match staged.entry(id) {
                MapEntry::Occupied(entry) => entry.into_mut(),
                MapEntry::Vacant(entry) => {
                    let current = self
                        .store
                        .get(entry.key())
                        .ok_or_else(|| FrameworkError::NotFound(entry.key().to_string()))?;
                    entry.insert(current.clone())
                }
            };
            results.push(item.handle_action(action).map_err(FrameworkError::Rejected)?);
        }

        self.store.extend(staged);
        if let Some(key) = key {
            self.committed_keys.insert(key);
        }
        Ok(TransactionOutcome::Committed(results))
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

// Derive would demand `T: Clone` on the handle itself.
impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        request: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, EntityError<T>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T::Id, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    /// Reads several records from one consistent snapshot, in request order.
    pub async fn get_many(&self, ids: Vec<T::Id>) -> Result<Vec<Option<T>>, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::GetMany { ids, respond_to }).await
    }

    pub async fn find(&self, filter: Filter<T>) -> Result<Vec<T>, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Find { filter, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    /// All-or-nothing application of actions across records. A `key` that was
    /// committed before turns the call into a no-op.
    pub async fn transact(
        &self,
        key: Option<String>,
        actions: Vec<(T::Id, T::Action)>,
    ) -> Result<TransactionOutcome<T::ActionResult>, EntityError<T>> {
        self.call(|respond_to| ResourceRequest::Transaction { key, actions, respond_to }).await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
