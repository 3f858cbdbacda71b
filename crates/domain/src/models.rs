use crate::identity::UserProfile;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Content ID cannot be empty.".to_string());
        }
        if s.len() > 128 {
            return Err("Content ID is too long (max 128 chars).".to_string());
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err("Content ID contains whitespace or control characters.".to_string());
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "posts")]
    Post,
    #[serde(rename = "pages")]
    Page,
    #[serde(rename = "notes")]
    Note,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "posts",
            ContentType::Page => "pages",
            ContentType::Note => "notes",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" | "posts" => Ok(ContentType::Post),
            "page" | "pages" => Ok(ContentType::Page),
            "note" | "notes" => Ok(ContentType::Note),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub id: ContentId,
    pub kind: ContentType,
}

impl ContentRef {
    pub fn new(id: ContentId, kind: ContentType) -> Self {
        Self { id, kind }
    }

    // 宿主页面缓存失效用的路径，例如 "/posts/p1"
    pub fn path(&self) -> String {
        format!("/{}/{}", self.kind, self.id)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    #[default]
    Published,
    Pending,
    Spam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub edited_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub state: ModerationState,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub display_key: String,
}

impl Comment {
    // 归属判断优先用后端下发的稳定 author_id，缺失时退回显示名比对
    pub fn is_authored_by(&self, user: &UserProfile) -> bool {
        match &self.author_id {
            Some(aid) => aid == &user.id,
            None => self.author_name == user.name,
        }
    }
}
