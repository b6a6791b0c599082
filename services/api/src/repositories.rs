//! Repositories for database operations

pub mod customer;
pub mod membership;
pub mod service_request;
pub mod user;

pub use customer::CustomerRepository;
pub use membership::MembershipRepository;
pub use service_request::{ServiceRequestRepository, StatusUpdateError};
pub use user::UserRepository;

/// Whether an error chain bottoms out in a unique-constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::PgPool;

    /// Connect to `DATABASE_URL` and apply migrations
    pub async fn migrated_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
        let pool = PgPool::connect(&url).await.expect("database reachable");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations apply");
        pool
    }

    /// Username that will not collide across test runs
    pub fn unique_username(prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
    }
}
