use crate::session::SessionHandle;
use crate::store::CommentStore;
use client::Api;
use domain::{Error, Result};
use std::sync::Arc;

// 管理动作全部走"服务器确认后整树刷新"，本地绝不先行翻状态；
// 失败时快照保持原样
pub struct ModerationActions {
    api: Arc<dyn Api>,
    store: Arc<CommentStore>,
    session: SessionHandle,
}

impl ModerationActions {
    pub fn new(api: Arc<dyn Api>, store: Arc<CommentStore>, session: SessionHandle) -> Self {
        Self {
            api,
            store,
            session,
        }
    }

    // 置顶/隐藏只对管理员开放，发包前就拦下
    fn admin_token(&self) -> Result<String> {
        match self.session.get() {
            Some(s) if s.user.is_admin => Ok(s.token),
            _ => Err(Error::Validation("Administrator access required.".into())),
        }
    }

    pub async fn set_pinned(&self, id: &str, pinned: bool) -> Result<()> {
        let token = self.admin_token()?;
        self.api.set_pinned(id, pinned, &token).await?;
        self.store.revalidate().await
    }

    pub async fn set_private(&self, id: &str, private: bool) -> Result<()> {
        let token = self.admin_token()?;
        self.api.set_private(id, private, &token).await?;
        self.store.revalidate().await
    }

    // 删除和编辑一样只认作者本人，管理员身份不放行
    pub async fn delete(&self, id: &str) -> Result<()> {
        let session = self
            .session
            .get()
            .ok_or_else(|| Error::Validation("Sign in to delete comments.".into()))?;
        let snapshot = self.store.current();
        let target = snapshot
            .tree
            .get(id)
            .ok_or_else(|| Error::Validation("Comment not found.".into()))?;
        if !target.is_authored_by(&session.user) {
            return Err(Error::Validation(
                "You can only delete your own comments.".into(),
            ));
        }
        self.api.delete_comment(id, &session.token).await?;
        self.store.revalidate().await
    }
}
