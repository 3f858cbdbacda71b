// 各模块测试共用的传输层替身：拉取结果走脚本队列，
// 变更调用全部录下来供断言
use async_trait::async_trait;
use client::{Api, CreateComment, Credential, RotatedToken, ThreadPayload};
use domain::{Comment, ContentRef, Error, LinkedAccount, ModerationState, Result, UserProfile};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn comment(id: &str, parent: Option<&str>, state: ModerationState) -> Comment {
    Comment {
        id: id.to_string(),
        author_name: format!("author-{}", id),
        author_id: None,
        avatar_url: None,
        content: format!("body of {}", id),
        created_at: chrono::DateTime::from_timestamp(1_700_000_000 + id.len() as i64, 0)
            .unwrap()
            .naive_utc(),
        edited_at: None,
        parent_id: parent.map(str::to_string),
        state,
        is_admin: false,
        is_private: false,
        pinned: false,
        provider: None,
        display_key: String::new(),
    }
}

pub fn payload(comments: Vec<Comment>) -> ThreadPayload {
    ThreadPayload {
        count: comments.len() as i64,
        comments,
    }
}

pub fn profile(id: &str, name: &str, admin: bool) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        avatar_url: None,
        is_admin: admin,
        provider: Some("github".into()),
    }
}

#[derive(Default)]
pub struct TestApi {
    pub fetch_calls: AtomicUsize,
    pub queue: Mutex<VecDeque<ThreadPayload>>,
    pub created: Mutex<Vec<CreateComment>>,
    pub create_error: Mutex<Option<Error>>,
    pub mutations: Mutex<Vec<String>>,
    pub mutation_error: Mutex<Option<Error>>,
    pub user: Mutex<Option<Result<UserProfile>>>,
    pub user_calls: AtomicUsize,
    pub user_tokens: Mutex<Vec<String>>,
    pub bind_result: Mutex<Option<Result<RotatedToken>>>,
    pub skip_result: Mutex<Option<Result<RotatedToken>>>,
}

impl TestApi {
    pub fn push_payload(&self, p: ThreadPayload) {
        self.queue.lock().unwrap().push_back(p);
    }

    // 队列只剩最后一份时反复返回它，脚本不够长也不会空窗
    fn next_payload(&self) -> ThreadPayload {
        let mut q = self.queue.lock().unwrap();
        match q.len() {
            0 => payload(vec![]),
            1 => q.front().cloned().unwrap_or_else(|| payload(vec![])),
            _ => q.pop_front().unwrap_or_else(|| payload(vec![])),
        }
    }

    fn mutation(&self, label: String) -> Result<()> {
        if let Some(e) = self.mutation_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.mutations.lock().unwrap().push(label);
        Ok(())
    }
}

#[async_trait]
impl Api for TestApi {
    async fn fetch_comments(
        &self,
        _target: &ContentRef,
        _token: Option<&str>,
    ) -> Result<ThreadPayload> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_payload())
    }

    async fn create_comment(&self, req: &CreateComment) -> Result<Comment> {
        if let Some(e) = self.create_error.lock().unwrap().clone() {
            return Err(e);
        }
        let author_name = match &req.credential {
            Credential::Guest(g) => g.name.clone(),
            Credential::Token(_) => "token-user".to_string(),
        };
        self.created.lock().unwrap().push(req.clone());
        let mut c = comment("new", req.parent.as_deref(), ModerationState::Published);
        c.author_name = author_name;
        c.content = req.text.clone();
        Ok(c)
    }

    async fn update_comment(&self, id: &str, text: &str, _token: &str) -> Result<Comment> {
        self.mutation(format!("update {} {}", id, text))?;
        let mut c = comment(id, None, ModerationState::Published);
        c.content = text.to_string();
        Ok(c)
    }

    async fn delete_comment(&self, id: &str, _token: &str) -> Result<()> {
        self.mutation(format!("delete {}", id))
    }

    async fn set_pinned(&self, id: &str, pinned: bool, _token: &str) -> Result<()> {
        self.mutation(format!("pin {} {}", id, pinned))
    }

    async fn set_private(&self, id: &str, private: bool, _token: &str) -> Result<()> {
        self.mutation(format!("private {} {}", id, private))
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.user_tokens.lock().unwrap().push(token.to_string());
        self.user
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(profile("u1", "Ada", false)))
    }

    async fn linked_accounts(&self, _token: &str) -> Result<Vec<LinkedAccount>> {
        Ok(vec![])
    }

    async fn bind_identity(&self, _name: &str, _email: &str, _token: &str) -> Result<RotatedToken> {
        self.bind_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RotatedToken { token: "T2".into() }))
    }

    async fn skip_bind(&self, _token: &str) -> Result<RotatedToken> {
        self.skip_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RotatedToken { token: "T2".into() }))
    }
}
