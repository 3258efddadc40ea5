use redis::AsyncCommands;

use super::HealthDependencyStatus;

impl HealthDependencyStatus {
    fn up() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    fn down(detail: String) -> Self {
        Self {
            status: "error",
            detail: Some(detail),
        }
    }

    pub(super) fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub(super) async fn check_postgres(pool: &sqlx::PgPool) -> HealthDependencyStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthDependencyStatus::up(),
        Err(error) => HealthDependencyStatus::down(format!("postgres check failed: {error}")),
    }
}

pub(super) async fn check_redis(
    redis_client: Option<&redis::Client>,
    redis_required: bool,
) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        if redis_required {
            return HealthDependencyStatus::down("redis client is not configured".to_owned());
        }
        return HealthDependencyStatus {
            status: "disabled",
            detail: None,
        };
    };

    let mut connection = match redis_client.get_multiplexed_async_connection().await {
        Ok(connection) => connection,
        Err(error) => {
            return HealthDependencyStatus::down(format!("redis connection failed: {error}"));
        }
    };

    match connection.ping::<String>().await {
        Ok(reply) if reply.eq_ignore_ascii_case("pong") => HealthDependencyStatus::up(),
        Ok(reply) => HealthDependencyStatus::down(format!("unexpected redis ping reply: {reply}")),
        Err(error) => HealthDependencyStatus::down(format!("redis ping failed: {error}")),
    }
}
