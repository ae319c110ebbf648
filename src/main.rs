use std::{process, sync::Arc};

use murmur::{
    application::{
        admin::{groups::AdminGroupService, posts::AdminPostService, users::AdminUserService},
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        posts::PostService,
        repos::{
            CommentsRepo, FollowsRepo, GroupsRepo, GroupsWriteRepo, HealthRepo, PostsRepo,
            PostsWriteRepo, UsersRepo,
        },
    },
    cache::{CacheConfig, FeedPageCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, AuthContext, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "murmur::migrate", "database migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let (http_state, admin_state) = build_states(repositories, &settings)?;

    serve_http(&settings, http_state, admin_state).await
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

fn build_states(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<(HttpState, AdminState), AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let groups_write_repo: Arc<dyn GroupsWriteRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::from(err)))?,
    );

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        follows_repo.clone(),
    ));
    let follows = Arc::new(FollowService::new(users_repo.clone(), follows_repo));
    let posts = Arc::new(PostService::new(
        posts_repo.clone(),
        posts_write_repo.clone(),
        groups_repo.clone(),
        comments_repo,
        upload_storage.clone(),
    ));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = cache_config
        .enable_feed_cache
        .then(|| Arc::new(FeedPageCache::new(&cache_config)));

    let upload_limit_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("uploads.max_request_bytes does not fit in memory"))
        .map_err(AppError::from)?;

    let http_state = HttpState {
        feed,
        posts,
        follows,
        auth: AuthContext {
            users: users_repo.clone(),
            settings: settings.auth.clone(),
        },
        health: health_repo.clone(),
        upload_storage,
        upload_limit_bytes,
        cache: cache.clone(),
    };

    let admin_state = AdminState {
        groups: Arc::new(AdminGroupService::new(groups_repo.clone(), groups_write_repo)),
        posts: Arc::new(AdminPostService::new(
            posts_repo,
            posts_write_repo,
            groups_repo,
        )),
        users: Arc::new(AdminUserService::new(users_repo)),
        health: health_repo,
        cache,
    };

    Ok((http_state, admin_state))
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "murmur::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    try_join!(
        async { public_server.await },
        async { admin_server.await }
    )
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "murmur::serve", "shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "murmur::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
