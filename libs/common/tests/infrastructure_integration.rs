//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL and Redis are reachable with the
//! configuration the services read from the environment. They need live
//! servers, so they only run with `--ignored`.

use grua_common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    let redis_pool = RedisPool::new(&RedisConfig::from_env())?;
    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_key";
    redis_pool.set(test_key, "1", Some(10)).await?;
    assert!(redis_pool.exists(test_key).await?, "Redis SET test failed");

    redis_pool.delete(test_key).await?;
    assert!(
        !redis_pool.exists(test_key).await?,
        "Redis delete operation failed"
    );

    Ok(())
}
