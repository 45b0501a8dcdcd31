pub mod config;
pub mod guard;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod testing;
pub mod transfer;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, NotifierBackend,
    PublishFailurePolicy, SanitizedConfig,
};
pub use guard::{FsObjectStore, IdempotencyGuard, ObjectLister, StorageError};
pub use notify::{create_gateway, create_notifier, NotificationGateway, Notifier, NotifyError};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, RunContext, TransferOrchestrator, TransferOutcome,
};
pub use transfer::{
    Destination, InvocationSettings, NotificationEvent, TransferRequest, WorkerResult,
    WorkerStatus,
};
pub use worker::{HttpWorker, RetryPolicy, Worker, WorkerError, WorkerInvoker};
