use sqlx::PgConnection;
use uuid::Uuid;

use shared::{Role, User};

use crate::error::AppResult;

const USER_COLUMNS: &str =
    "id, username, full_name, email, phone, role, is_active, created_at, updated_at";

/// Credentials row used by login
#[derive(Debug, sqlx::FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

pub async fn find_credentials(
    conn: &mut PgConnection,
    username: &str,
) -> AppResult<Option<Credentials>> {
    let row = sqlx::query_as::<_, Credentials>(
        "SELECT id, role, password_hash, is_active FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

/// Active users whose role is in `roles`; used to reach an approver pool
pub async fn active_ids_with_roles(conn: &mut PgConnection, roles: &[Role]) -> AppResult<Vec<Uuid>> {
    let mut ids = Vec::new();
    for role in roles {
        let mut batch: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE role = $1 AND is_active = TRUE")
                .bind(*role)
                .fetch_all(&mut *conn)
                .await?;
        ids.append(&mut batch);
    }
    Ok(ids)
}
