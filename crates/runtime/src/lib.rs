use std::sync::Arc;

use anyhow::Context;
use roster_config::{AppConfig, DEFAULT_JWT_SECRET};
use roster_gateway::{GatewayState, HttpMetrics, RosterUserService};
use roster_users::{
    InMemoryUserRepository, JwtManager, RandomAvatarGenerator, Role, UserError, UserService,
};
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::anyhow;
    use roster_config::{LogConfig, LogFormat};
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Install the global subscriber. `RUST_LOG` wins over the configured level.
    pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .or_else(|_| EnvFilter::try_new("info"))
            .map_err(|error| anyhow!(error))?;

        let builder = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(false);

        match config.format {
            LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
            LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        }
        .map_err(|error| anyhow!(error))
    }
}

/// Accounts created when `seed.examples` is enabled.
const EXAMPLE_ACCOUNTS: &[(&str, &str, &str, &str, Role)] = &[
    (
        "Davide",
        "Vanoncini",
        "davidevanoncini2003@gmail.com",
        "password",
        Role::Admin,
    ),
    ("John", "Doe", "johndoe@bingchilling.cn", "123secure", Role::User),
    ("Foo", "Bar", "foo@bar.com", "psw1", Role::Immutable),
];

pub struct BackendServices {
    pub user_service: Arc<RosterUserService>,
    pub jwt: Arc<JwtManager>,
    pub metrics: Arc<HttpMetrics>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> anyhow::Result<Self> {
        if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("auth.jwt_secret is the built-in default, set ROSTER__AUTH__JWT_SECRET before deploying");
        }

        let user_service = UserService::new(
            InMemoryUserRepository::new(),
            RandomAvatarGenerator::from_config(&config.avatar),
        )
        .with_forbidden_policy(config.auth.forbidden_policy);

        let jwt = JwtManager::from_config(&config.auth, config.issuer());

        let metrics = HttpMetrics::new().context("failed to register http metrics")?;

        let services = Self {
            user_service: Arc::new(user_service),
            jwt: Arc::new(jwt),
            metrics: Arc::new(metrics),
        };

        if config.seed.examples {
            services
                .seed_examples()
                .await
                .context("failed to seed example accounts")?;
        }

        info!(
            issuer = services.jwt.issuer(),
            forbidden_policy = ?config.auth.forbidden_policy,
            "backend services initialised"
        );

        Ok(services)
    }

    /// State handed to the HTTP router.
    pub fn gateway_state(&self) -> GatewayState {
        GatewayState::new(
            self.user_service.clone(),
            self.jwt.clone(),
            self.metrics.clone(),
        )
    }

    async fn seed_examples(&self) -> anyhow::Result<()> {
        for (first_name, last_name, email, password, role) in EXAMPLE_ACCOUNTS {
            match self
                .user_service
                .create_user(first_name, last_name, email, password, *role)
                .await
            {
                Ok(id) => info!(user_id = id, email, %role, "seeded example account"),
                Err(UserError::AlreadyExists { id }) => {
                    info!(user_id = id, email, "example account already present")
                }
                Err(error) => {
                    return Err(error).with_context(|| format!("could not create {email}"))
                }
            }
        }
        Ok(())
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to install Ctrl+C handler");
        return;
    }

    info!("shutdown signal received");
}
