use chrono::NaiveDateTime;
use domain::{Comment, CommentTree, GuestIdentity, ModerationState, SessionIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerKind {
    Reply,
    Edit,
}

// 每个节点同一时刻只挂一个 composer，回复和编辑互斥
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenComposer {
    pub node: Option<String>,
    pub kind: ComposerKind,
}

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub session: Option<SessionIdentity>,
    pub guest: Option<GuestIdentity>,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.user.is_admin)
    }

    pub fn owns(&self, c: &Comment) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| c.is_authored_by(&s.user))
    }

    // 匿名作者只能靠昵称对上号，用于"自己的评论还在审核中"的可见性
    fn guest_authored(&self, c: &Comment) -> bool {
        self.guest.as_ref().is_some_and(|g| g.name == c.author_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    Admin,
    Pinned,
    Pending,
    Spam,
    Private,
    Edited,
    Provider(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actions {
    pub reply: bool,
    pub edit: bool,
    pub delete: bool,
    pub pin: bool,
    pub hide: bool,
}

// 越过深度上限的节点要能指回真正的父节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub parent_id: String,
    pub parent_author: String,
}

#[derive(Debug, Clone)]
pub struct RenderNode {
    pub id: String,
    // 视觉深度（封顶后），不是树里的真实深度
    pub depth: usize,
    pub author_name: String,
    pub avatar_url: Option<String>,
    pub display_key: String,
    pub created_at: NaiveDateTime,
    // 原始 markdown，净化与渲染由宿主完成
    pub body_markdown: String,
    pub badges: Vec<Badge>,
    pub actions: Actions,
    pub breadcrumb: Option<Breadcrumb>,
    pub highlighted: bool,
    pub muted: bool,
    pub composer: Option<ComposerKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub max_depth: usize,
    pub interactive: bool,
}

fn visible(viewer: &Viewer, c: &Comment) -> bool {
    if c.is_private && !(viewer.is_admin() || viewer.owns(c)) {
        return false;
    }
    match c.state {
        ModerationState::Published => true,
        // 审核中的评论只有作者本人（含匿名作者）和管理员可见
        ModerationState::Pending => {
            viewer.is_admin() || viewer.owns(c) || viewer.guest_authored(c)
        }
        ModerationState::Spam => viewer.is_admin(),
    }
}

fn badges_for(c: &Comment) -> Vec<Badge> {
    let mut out = Vec::new();
    if c.is_admin {
        out.push(Badge::Admin);
    }
    if c.pinned {
        out.push(Badge::Pinned);
    }
    match c.state {
        ModerationState::Pending => out.push(Badge::Pending),
        ModerationState::Spam => out.push(Badge::Spam),
        ModerationState::Published => {}
    }
    if c.is_private {
        out.push(Badge::Private);
    }
    if c.edited_at.is_some() {
        out.push(Badge::Edited);
    }
    if let Some(p) = &c.provider {
        out.push(Badge::Provider(p.clone()));
    }
    out
}

fn actions_for(viewer: &Viewer, c: &Comment, editing_this: bool, opts: RenderOptions) -> Actions {
    if !opts.interactive {
        return Actions::default();
    }
    let owns = viewer.owns(c);
    Actions {
        reply: !editing_this,
        edit: owns,
        delete: owns,
        pin: viewer.is_admin(),
        hide: viewer.is_admin(),
    }
}

// 从快照出发的纯函数：树 + 观察者 + 打开的 composer + 当前高亮 → 渲染序列。
// 超过 max_depth 的节点以封顶祖先的兄弟姿态平铺，面包屑指回真实父节点
pub fn plan(
    tree: &CommentTree,
    viewer: &Viewer,
    open: Option<&OpenComposer>,
    highlight: Option<&str>,
    opts: RenderOptions,
) -> Vec<RenderNode> {
    let mut out = Vec::with_capacity(tree.len());
    let mut stack: Vec<(usize, &str)> = tree
        .roots()
        .iter()
        .rev()
        .map(|id| (0usize, id.as_str()))
        .collect();

    while let Some((depth, id)) = stack.pop() {
        let Some(c) = tree.get(id) else {
            continue;
        };
        // 不可见节点整棵子树一起剪掉
        if !visible(viewer, c) {
            continue;
        }

        let editing_this = opts.interactive
            && open.is_some_and(|o| {
                o.kind == ComposerKind::Edit && o.node.as_deref() == Some(id)
            });
        let composer = if opts.interactive {
            open.and_then(|o| {
                if o.node.as_deref() == Some(id) {
                    Some(o.kind)
                } else {
                    None
                }
            })
        } else {
            None
        };

        let breadcrumb = if depth > opts.max_depth {
            tree.parent_of(id).map(|p| Breadcrumb {
                parent_id: p.id.clone(),
                parent_author: p.author_name.clone(),
            })
        } else {
            None
        };

        out.push(RenderNode {
            id: c.id.clone(),
            depth: depth.min(opts.max_depth),
            author_name: c.author_name.clone(),
            avatar_url: c.avatar_url.clone(),
            display_key: c.display_key.clone(),
            created_at: c.created_at,
            body_markdown: c.content.clone(),
            badges: badges_for(c),
            actions: actions_for(viewer, c, editing_this, opts),
            breadcrumb,
            highlighted: highlight == Some(id),
            muted: c.state != ModerationState::Published,
            composer,
        });

        for child in tree.children_of(id).iter().rev() {
            stack.push((depth + 1, child.as_str()));
        }
    }
    out
}

// 服务端预渲染的隐藏副本：封顶、无动作、无 composer，
// 只为可索引性保留
pub fn prerender(tree: &CommentTree, max_depth: usize) -> Vec<RenderNode> {
    plan(
        tree,
        &Viewer::default(),
        None,
        None,
        RenderOptions {
            max_depth,
            interactive: false,
        },
    )
}
