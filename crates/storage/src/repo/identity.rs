use crate::models::{GuestRow, SessionRow};
use crate::LocalStore;
use domain::{GuestIdentity, SessionIdentity};

impl LocalStore {
    pub async fn save_guest(&self, guest: &GuestIdentity) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO guest_identity (id, name, email, url)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                url = excluded.url
            "#,
        )
        .bind(&guest.name)
        .bind(&guest.email)
        .bind(&guest.url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_guest(&self) -> anyhow::Result<Option<GuestIdentity>> {
        let row = sqlx::query_as::<_, GuestRow>(
            "SELECT name, email, url FROM guest_identity WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn save_session(&self, session: &SessionIdentity) -> anyhow::Result<()> {
        let user_json = serde_json::to_string(&session.user)?;
        sqlx::query(
            r#"
            INSERT INTO session (id, user_json, token, saved_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                user_json = excluded.user_json,
                token = excluded.token,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(user_json)
        .bind(&session.token)
        .bind(chrono::Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_session(&self) -> anyhow::Result<Option<SessionIdentity>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT user_json, token FROM session WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => match SessionIdentity::try_from(row) {
                Ok(s) => Ok(Some(s)),
                Err(e) => {
                    // 损坏的登录态当作未登录，不让整个启动失败
                    tracing::warn!("Dropping unreadable session row: {}", e);
                    self.clear_session().await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn clear_session(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM session WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
