use crate::traits::{Api, CreateComment, Credential, RotatedToken, ThreadPayload};
use async_trait::async_trait;
use domain::{Comment, ContentRef, Error, LinkedAccount, Result, UserProfile};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpApi {
    base: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct FetchEnvelope {
    status: String,
    #[serde(default)]
    data: Option<ThreadPayload>,
}

#[derive(Deserialize)]
struct MutationEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

fn transport(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

fn bad_body(e: impl std::fmt::Display) -> Error {
    Error::Network(format!("invalid response: {}", e))
}

fn parse_fetch(body: &str) -> Result<ThreadPayload> {
    let env: FetchEnvelope = serde_json::from_str(body).map_err(bad_body)?;
    match env.data {
        Some(data) if env.status == "success" => Ok(data),
        _ => Err(Error::server(-1, format!("fetch failed: {}", env.status))),
    }
}

fn parse_mutation<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let env: MutationEnvelope<T> = serde_json::from_str(body).map_err(bad_body)?;
    if env.code != 0 {
        return Err(Error::server(
            env.code,
            env.message.unwrap_or_default(),
        ));
    }
    Ok(env.data)
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            base: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    // 统一收尾：401 归为 Auth（上层据此静默登出），其余非 2xx 归为 Server
    async fn read_body(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Auth);
        }
        if !status.is_success() {
            return Err(Error::server(status.as_u16() as i64, body));
        }
        Ok(body)
    }

    async fn mutate<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<Option<T>> {
        let resp = req.send().await.map_err(transport)?;
        let body = Self::read_body(resp).await?;
        parse_mutation(&body)
    }

    async fn mutate_expecting<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T> {
        self.mutate(req)
            .await?
            .ok_or_else(|| bad_body("missing data"))
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn fetch_comments(
        &self,
        target: &ContentRef,
        token: Option<&str>,
    ) -> Result<ThreadPayload> {
        let mut req = self
            .http
            .get(self.url("/api/comments"))
            .query(&[("ref", target.id.as_str()), ("ref_type", target.kind.as_str())]);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let resp = req.send().await.map_err(transport)?;
        let body = Self::read_body(resp).await?;
        parse_fetch(&body)
    }

    async fn create_comment(&self, req: &CreateComment) -> Result<Comment> {
        let mut body = json!({
            "ref": req.target.id.as_str(),
            "ref_type": req.target.kind.as_str(),
            "text": req.text,
        });
        if let Some(parent) = &req.parent {
            body["parent"] = json!(parent);
        }
        let mut http_req = self.http.post(self.url("/api/comment"));
        match &req.credential {
            Credential::Token(t) => http_req = http_req.bearer_auth(t),
            Credential::Guest(g) => {
                body["author"] = json!(g.name);
                body["mail"] = json!(g.email);
                if let Some(url) = &g.url {
                    body["url"] = json!(url);
                }
            }
        }
        self.mutate_expecting(http_req.json(&body)).await
    }

    async fn update_comment(&self, id: &str, text: &str, token: &str) -> Result<Comment> {
        let req = self
            .http
            .put(self.url(&format!("/api/comment/{}", id)))
            .bearer_auth(token)
            .json(&json!({ "text": text }));
        self.mutate_expecting(req).await
    }

    async fn delete_comment(&self, id: &str, token: &str) -> Result<()> {
        let req = self
            .http
            .delete(self.url(&format!("/api/comment/{}", id)))
            .bearer_auth(token);
        self.mutate::<serde_json::Value>(req).await.map(|_| ())
    }

    async fn set_pinned(&self, id: &str, pinned: bool, token: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url(&format!("/api/comment/{}/pin", id)))
            .bearer_auth(token)
            .json(&json!({ "pinned": pinned }));
        self.mutate::<serde_json::Value>(req).await.map(|_| ())
    }

    async fn set_private(&self, id: &str, private: bool, token: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url(&format!("/api/comment/{}/visibility", id)))
            .bearer_auth(token)
            .json(&json!({ "private": private }));
        self.mutate::<serde_json::Value>(req).await.map(|_| ())
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile> {
        let req = self.http.get(self.url("/api/user")).bearer_auth(token);
        self.mutate_expecting(req).await
    }

    async fn linked_accounts(&self, token: &str) -> Result<Vec<LinkedAccount>> {
        let req = self
            .http
            .get(self.url("/api/user/accounts"))
            .bearer_auth(token);
        self.mutate_expecting(req).await
    }

    async fn bind_identity(&self, name: &str, email: &str, token: &str) -> Result<RotatedToken> {
        let req = self
            .http
            .post(self.url("/api/user/bind"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "email": email }));
        self.mutate_expecting(req).await
    }

    async fn skip_bind(&self, token: &str) -> Result<RotatedToken> {
        let req = self
            .http
            .post(self.url("/api/user/bind/skip"))
            .bearer_auth(token);
        self.mutate_expecting(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_envelope() {
        let body = r#"{
            "status": "success",
            "data": {
                "count": 2,
                "comments": [
                    {"id": "c1", "author_name": "Ada", "content": "hi",
                     "created_at": "2024-03-01T12:00:00"},
                    {"id": "c2", "author_name": "Bob", "content": "yo",
                     "created_at": "2024-03-01T12:05:00", "parent_id": "c1",
                     "state": "pending"}
                ]
            }
        }"#;
        let payload = parse_fetch(body).unwrap();
        assert_eq!(payload.count, 2);
        assert_eq!(payload.comments.len(), 2);
        assert_eq!(
            payload.comments[1].state,
            domain::ModerationState::Pending
        );
    }

    #[test]
    fn test_parse_fetch_failure_status() {
        let body = r#"{ "status": "error" }"#;
        assert!(matches!(
            parse_fetch(body),
            Err(Error::Server { .. })
        ));
    }

    #[test]
    fn test_parse_mutation_envelope() {
        let ok: Option<RotatedToken> =
            parse_mutation(r#"{ "code": 0, "data": { "token": "T2" } }"#).unwrap();
        assert_eq!(ok.unwrap().token, "T2");

        let err = parse_mutation::<RotatedToken>(
            r#"{ "code": 1002, "message": "duplicate comment" }"#,
        );
        match err {
            Err(Error::Server { code, message }) => {
                assert_eq!(code, 1002);
                assert_eq!(message, "duplicate comment");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage_is_network_class() {
        assert!(matches!(
            parse_mutation::<serde_json::Value>("<html>busted</html>"),
            Err(Error::Network(_))
        ));
    }
}
