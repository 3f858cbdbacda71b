use crate::models::{Comment, ModerationState};
use std::collections::HashMap;

// id 索引的 arena：父指针查祖先是 O(深度)，不做全树扫描。
// 每次拉取整棵重建，绝不原地增量修补。
#[derive(Debug, Clone, Default)]
pub struct CommentTree {
    nodes: HashMap<String, Comment>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl CommentTree {
    pub fn from_flat(comments: Vec<Comment>) -> Self {
        let mut order: Vec<String> = Vec::with_capacity(comments.len());
        let mut nodes: HashMap<String, Comment> = HashMap::with_capacity(comments.len());
        for c in comments {
            if !nodes.contains_key(&c.id) {
                order.push(c.id.clone());
            }
            nodes.insert(c.id.clone(), c);
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut roots: Vec<String> = Vec::new();
        for id in &order {
            let parent = nodes.get(id).and_then(|c| c.parent_id.clone());
            match parent {
                // 父节点不在本次快照里的孤儿提升为根，不丢弃
                Some(p) if p != *id && nodes.contains_key(&p) => {
                    children.entry(p).or_default().push(id.clone());
                }
                _ => roots.push(id.clone()),
            }
        }

        let key = |nodes: &HashMap<String, Comment>, id: &String| {
            let c = &nodes[id];
            (c.created_at, c.id.clone())
        };
        for list in children.values_mut() {
            list.sort_by_key(|id| key(&nodes, id));
        }
        // 根级排序：置顶优先，再按时间
        roots.sort_by_key(|id| (!nodes[id].pinned, key(&nodes, id)));

        Self {
            nodes,
            children,
            roots,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.nodes.get(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&Comment> {
        let pid = self.nodes.get(id)?.parent_id.as_deref()?;
        self.nodes.get(pid)
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn depth_of(&self, id: &str) -> Option<usize> {
        let mut cur = self.nodes.get(id)?;
        let mut depth = 0usize;
        let mut hops = 0usize;
        while let Some(pid) = cur.parent_id.as_deref() {
            if pid == cur.id {
                break;
            }
            match self.nodes.get(pid) {
                Some(p) => {
                    depth += 1;
                    cur = p;
                }
                None => break,
            }
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
        }
        Some(depth)
    }

    // 先序遍历，携带真实深度
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &str)> = self
            .roots
            .iter()
            .rev()
            .map(|id| (0usize, id.as_str()))
            .collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push((depth, node));
            if let Some(kids) = self.children.get(id) {
                for k in kids.iter().rev() {
                    stack.push((depth + 1, k.as_str()));
                }
            }
        }
        out
    }

    pub fn has_pending(&self) -> bool {
        let mut stack: Vec<&str> = self.roots.iter().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                if node.state == ModerationState::Pending {
                    return true;
                }
            }
            if let Some(kids) = self.children.get(id) {
                stack.extend(kids.iter().map(String::as_str));
            }
        }
        false
    }
}
