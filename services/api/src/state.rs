//! Application state shared across handlers

use sqlx::PgPool;
use std::sync::Arc;

use grua_common::cache::RedisPool;

use crate::{
    booking::Booking,
    config::AppConfig,
    jwt::JwtService,
    notifications::NotificationHub,
    repositories::{
        CustomerRepository, MembershipRepository, ServiceRequestRepository, UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub customer_repository: CustomerRepository,
    pub membership_repository: MembershipRepository,
    pub service_request_repository: ServiceRequestRepository,
    pub notifications: NotificationHub,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        redis_pool: RedisPool,
        jwt_service: JwtService,
        notifications: NotificationHub,
        config: AppConfig,
    ) -> Self {
        Self {
            user_repository: UserRepository::new(db_pool.clone()),
            customer_repository: CustomerRepository::new(db_pool.clone()),
            membership_repository: MembershipRepository::new(db_pool.clone()),
            service_request_repository: ServiceRequestRepository::new(db_pool.clone()),
            db_pool,
            redis_pool,
            jwt_service,
            notifications,
            config: Arc::new(config),
        }
    }

    /// Request-creation flow wired to this state
    pub fn booking(&self) -> Booking<'_> {
        Booking {
            memberships: &self.membership_repository,
            requests: &self.service_request_repository,
            hub: &self.notifications,
            default_tariff: &self.config.default_tariff,
        }
    }
}
