use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};

mod models;
mod repo;

// 浏览器里是 localStorage，这里落到一个本地 SQLite 文件：
// 草稿、匿名身份、登录态都在里面
#[derive(Clone)]
pub struct LocalStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl LocalStore {
    pub async fn open(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path = Path::new(db_url.trim_start_matches("sqlite://"));
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // 内存库每条连接各自独立，必须收敛到单连接
        let max_conns = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_conns)
            .connect(db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL;").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL;").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;

        tracing::debug!("Local store ready at {}", db_url);
        Ok(Self { pool })
    }
}
