use sqlx::PgExecutor;

use crate::models::user::User;
use crate::types::UserId;

const SELECT_COLUMNS: &str = "id, username, full_name, role, created_at";

pub async fn find_user_by_id<'e, E>(executor: E, id: UserId) -> Result<Option<User>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM users WHERE id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}
