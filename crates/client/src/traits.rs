use async_trait::async_trait;
use domain::{Comment, ContentRef, GuestIdentity, LinkedAccount, Result, UserProfile};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadPayload {
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub count: i64,
}

// 两条互斥的提交路径：带 token（服务端从 token 推作者），
// 或匿名（请求体带 name/mail/url）
#[derive(Debug, Clone)]
pub enum Credential {
    Token(String),
    Guest(GuestIdentity),
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub target: ContentRef,
    pub parent: Option<String>,
    pub text: String,
    pub credential: Credential,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotatedToken {
    pub token: String,
}

// 传输层的接缝：引擎只认这个 trait，测试替身直接实现它
#[async_trait]
pub trait Api: Send + Sync {
    async fn fetch_comments(
        &self,
        target: &ContentRef,
        token: Option<&str>,
    ) -> Result<ThreadPayload>;

    async fn create_comment(&self, req: &CreateComment) -> Result<Comment>;
    async fn update_comment(&self, id: &str, text: &str, token: &str) -> Result<Comment>;
    async fn delete_comment(&self, id: &str, token: &str) -> Result<()>;
    async fn set_pinned(&self, id: &str, pinned: bool, token: &str) -> Result<()>;
    async fn set_private(&self, id: &str, private: bool, token: &str) -> Result<()>;

    async fn current_user(&self, token: &str) -> Result<UserProfile>;
    async fn linked_accounts(&self, token: &str) -> Result<Vec<LinkedAccount>>;
    async fn bind_identity(&self, name: &str, email: &str, token: &str) -> Result<RotatedToken>;
    async fn skip_bind(&self, token: &str) -> Result<RotatedToken>;
}
