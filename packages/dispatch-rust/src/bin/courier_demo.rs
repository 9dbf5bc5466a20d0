//! Sample application: user commands and queries over an in-memory store,
//! dispatched through the mediator with the built-in behaviors enabled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use courier::telemetry::{init_tracing, LogFormat, TelemetryConfig};
use courier::{HandlerRegistry, Mediator, MediatorConfig, Next, PipelineBehavior, RequestContext};
use courier_core::{
    Command, Error, Outcome, Query, Request, RequestHandler, ValidationPropertyError,
    ValidationResult, Validator,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "courier-demo", about = "Dispatch sample user requests through courier")]
struct Args {
    /// Name of the user to create.
    #[arg(long, default_value = "Ada Lovelace")]
    name: String,
    /// Email of the user to create.
    #[arg(long, default_value = "ada@example.com")]
    email: String,
    /// Artificial handler latency, to trip the slow request warning.
    #[arg(long, default_value_t = 0)]
    handler_delay_ms: u64,
    #[arg(long, env = "COURIER_SLOW_REQUEST_MS", default_value_t = 500)]
    slow_request_ms: u64,
    #[arg(long, env = "COURIER_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
    #[arg(long = "log", env = "COURIER_LOG", default_value = "info")]
    log_filter: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct User {
    id: Uuid,
    name: String,
    email: String,
}

#[derive(Default)]
struct UserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl UserStore {
    fn email_taken(&self, email: &str) -> bool {
        self.users
            .lock()
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(email))
    }

    fn insert(&self, user: User) {
        self.users.lock().insert(user.id, user);
    }

    fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().get(&id).cloned()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

struct CreateUser {
    name: String,
    email: String,
}

impl Request for CreateUser {
    type Response = Outcome<Uuid>;
}

impl Command for CreateUser {}

struct GetUserById {
    id: Uuid,
}

impl Request for GetUserById {
    type Response = Outcome<User>;
}

impl Query for GetUserById {}

// ---------------------------------------------------------------------------
// Handlers, validators, behaviors
// ---------------------------------------------------------------------------

struct CreateUserHandler {
    store: Arc<UserStore>,
    delay: Duration,
}

#[async_trait]
impl RequestHandler<CreateUser> for CreateUserHandler {
    async fn handle(
        &self,
        request: &CreateUser,
        cancellation: CancellationToken,
    ) -> anyhow::Result<Outcome<Uuid>> {
        tokio::select! {
            () = cancellation.cancelled() => anyhow::bail!("create user cancelled"),
            () = tokio::time::sleep(self.delay) => {}
        }

        if self.store.email_taken(&request.email) {
            return Ok(Outcome::failure(Error::conflict(
                "User.EmailTaken",
                format!("email {} is already registered", request.email),
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: request.email.clone(),
        };
        let id = user.id;
        self.store.insert(user);
        Ok(Outcome::success(id))
    }
}

struct GetUserByIdHandler {
    store: Arc<UserStore>,
}

#[async_trait]
impl RequestHandler<GetUserById> for GetUserByIdHandler {
    async fn handle(
        &self,
        request: &GetUserById,
        _cancellation: CancellationToken,
    ) -> anyhow::Result<Outcome<User>> {
        Ok(self.store.get(request.id).map_or_else(
            || {
                Outcome::failure(Error::not_found(
                    "User.NotFound",
                    format!("user {} was not found", request.id),
                ))
            },
            Outcome::success,
        ))
    }
}

struct CreateUserValidator;

impl Validator<CreateUser> for CreateUserValidator {
    fn validate(&self, request: &CreateUser) -> ValidationResult {
        let mut result = ValidationResult::success();
        if request.name.trim().is_empty() {
            result.push(ValidationPropertyError::new("Name", "Name cannot be empty"));
        }
        if !request.email.contains('@') {
            result.push(ValidationPropertyError::new(
                "Email",
                "Email must contain '@'",
            ));
        }
        result
    }
}

/// Tags each `CreateUser` dispatch with the acting user for later stages.
struct AuditBehavior;

#[async_trait]
impl PipelineBehavior<CreateUser> for AuditBehavior {
    async fn handle<'a>(
        &self,
        ctx: &'a RequestContext<CreateUser>,
        next: Next<'a, Outcome<Uuid>>,
    ) -> anyhow::Result<Outcome<Uuid>> {
        let actor = if ctx.user_id().is_empty() {
            "system".to_string()
        } else {
            ctx.user_id().to_string()
        };
        ctx.add_item("audit.actor", actor.clone())?;

        let outcome = next().await?;
        if outcome.is_success() {
            tracing::info!(actor = actor.as_str(), user_id = %outcome.value(), "user created");
        }
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Rendered<'a, V: Serialize> {
    request: &'static str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a V>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a Error>,
}

fn print_outcome<V: Serialize>(request: &'static str, outcome: &Outcome<V>) -> anyhow::Result<()> {
    let rendered = Rendered {
        request,
        success: outcome.is_success(),
        value: outcome.try_value().ok(),
        error: outcome.is_failure().then(|| outcome.error()),
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&TelemetryConfig {
        filter: args.log_filter.clone(),
        format: args.log_format,
    })?;

    let config = MediatorConfig {
        slow_request_threshold_ms: args.slow_request_ms,
        ..MediatorConfig::default()
    };
    let store = Arc::new(UserStore::default());
    let registry = HandlerRegistry::builder()
        .with_config(&config)
        .behavior::<CreateUser, _>(AuditBehavior)
        .handler::<CreateUser, _>(CreateUserHandler {
            store: Arc::clone(&store),
            delay: Duration::from_millis(args.handler_delay_ms),
        })
        .handler::<GetUserById, _>(GetUserByIdHandler {
            store: Arc::clone(&store),
        })
        .validator::<CreateUser, _>(CreateUserValidator)
        .build()?;
    let mediator = Mediator::builder().registry(registry).build();

    let created = mediator
        .send(CreateUser {
            name: args.name.clone(),
            email: args.email.clone(),
        })
        .await?;
    print_outcome("CreateUser", &created)?;

    let duplicate = mediator
        .send(CreateUser {
            name: args.name,
            email: args.email,
        })
        .await?;
    print_outcome("CreateUser", &duplicate)?;

    let invalid = mediator
        .send(CreateUser {
            name: String::new(),
            email: "nobody".to_string(),
        })
        .await?;
    print_outcome("CreateUser", &invalid)?;

    if let Ok(id) = created.try_value() {
        let found = mediator.send(GetUserById { id: *id }).await?;
        print_outcome("GetUserById", &found)?;
    }

    let missing = mediator.send(GetUserById { id: Uuid::nil() }).await?;
    print_outcome("GetUserById", &missing)?;

    Ok(())
}
