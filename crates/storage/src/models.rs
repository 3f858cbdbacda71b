use domain::{GuestIdentity, SessionIdentity, UserProfile};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct GuestRow {
    pub name: String,
    pub email: String,
    pub url: Option<String>,
}

impl From<GuestRow> for GuestIdentity {
    fn from(row: GuestRow) -> Self {
        GuestIdentity {
            name: row.name,
            email: row.email,
            url: row.url,
        }
    }
}

#[derive(FromRow)]
pub struct SessionRow {
    pub user_json: String,
    pub token: String,
}

impl TryFrom<SessionRow> for SessionIdentity {
    type Error = serde_json::Error;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let user: UserProfile = serde_json::from_str(&row.user_json)?;
        Ok(SessionIdentity {
            user,
            token: row.token,
        })
    }
}
