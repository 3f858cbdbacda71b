// 对着线上后端拉一个评论区并打印渲染序列，联调用
use anyhow::Context;
use domain::{ContentId, ContentRef, ContentType};
use engine::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let id = args.next().unwrap_or_else(|| "hello-world".to_string());
    let kind: ContentType = args
        .next()
        .unwrap_or_else(|| "posts".to_string())
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Settings::new().context("Failed to load configuration")?;
    let app = AppState::init(settings).await?;

    let target = ContentRef::new(
        ContentId::new(id).map_err(|e| anyhow::anyhow!(e))?,
        kind,
    );
    println!("Fetching thread for {} ...", target);

    let thread = app.open_thread(target.clone());
    thread.store.activate().await?;

    let snapshot = thread.store.current();
    println!(
        "{} comment(s), pending moderation: {}",
        snapshot.count, snapshot.has_pending
    );

    for node in thread.plan(None).await {
        let indent = "  ".repeat(node.depth);
        let crumb = node
            .breadcrumb
            .as_ref()
            .map(|b| format!(" (reply to @{})", b.parent_author))
            .unwrap_or_default();
        let badges = if node.badges.is_empty() {
            String::new()
        } else {
            format!(" {:?}", node.badges)
        };
        println!("{}- {}{}{}", indent, node.author_name, crumb, badges);
        for line in node.body_markdown.lines() {
            println!("{}    {}", indent, line);
        }
    }

    if snapshot.has_pending {
        println!(
            "Thread has pending comments; the engine would re-poll every {}s until settled.",
            app.settings.thread.poll_interval_secs
        );
    }
    thread.polling.shutdown();

    Ok(())
}
