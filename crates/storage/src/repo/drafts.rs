use crate::LocalStore;
use domain::ContentRef;

impl LocalStore {
    // 空文本等价于清除：不存空串，直接删键
    pub async fn save_draft(
        &self,
        target: &ContentRef,
        parent: Option<&str>,
        body: &str,
    ) -> anyhow::Result<()> {
        if body.trim().is_empty() {
            return self.delete_draft(target, parent).await;
        }
        sqlx::query(
            r#"
            INSERT INTO drafts (content_id, content_type, parent_id, body, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(content_id, content_type, parent_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(target.id.as_str())
        .bind(target.kind.as_str())
        .bind(parent.unwrap_or(""))
        .bind(body)
        .bind(chrono::Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_draft(
        &self,
        target: &ContentRef,
        parent: Option<&str>,
    ) -> anyhow::Result<Option<String>> {
        let body: Option<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM drafts
            WHERE content_id = ? AND content_type = ? AND parent_id = ?
            "#,
        )
        .bind(target.id.as_str())
        .bind(target.kind.as_str())
        .bind(parent.unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;
        Ok(body)
    }

    pub async fn delete_draft(
        &self,
        target: &ContentRef,
        parent: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM drafts
            WHERE content_id = ? AND content_type = ? AND parent_id = ?
            "#,
        )
        .bind(target.id.as_str())
        .bind(target.kind.as_str())
        .bind(parent.unwrap_or(""))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
