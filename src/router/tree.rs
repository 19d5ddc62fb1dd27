//! Character-level prefix tree holding the routes of one HTTP method.
//!
//! Every character of a registered path (after the leading `/`) becomes one
//! node, so `/hello` and `/hello2` share the five nodes of `hello` and differ
//! only in the final `2`. The node reached after the last character is a leaf
//! and carries the [`Route`].
//!
//! ## Lookup
//!
//! [`PathTree::find`] supports the two lookup modes the dispatcher needs:
//!
//! - **Exact**: walking the request path reaches a leaf whose stored path is
//!   the request path itself; that single node is returned
//! - **Prefix**: the walk consumes the whole request path without an exact
//!   hit; every leaf below the last node is returned in level order
//!
//! A missing edge during the walk returns nothing.
//!
//! ## Ordering
//!
//! Children are kept in insertion order, and every leaf remembers when its path
//! was first registered. [`PathTree::leaves`] returns leaves in that order,
//! which is the order the dispatcher tries patterns in.

use std::collections::VecDeque;
use std::sync::Arc;

/// Route data stored on a leaf node.
#[derive(Debug, Clone)]
pub struct Route<H> {
    /// The registered path, always starting with `/`
    pub path: String,
    /// Handler invoked when this route is dispatched
    pub handler: H,
    /// Group prefixes active at registration time, outermost (`/`) first
    pub group_prefixes: Arc<[Arc<str>]>,
    /// Position of the first registration of `path` within its tree
    pub order: usize,
}

/// One node of the tree, keyed by a single path character.
#[derive(Debug, Clone)]
pub struct TreeNode<H> {
    key: char,
    depth: usize,
    children: Vec<TreeNode<H>>,
    leaf: Option<Route<H>>,
}

impl<H> TreeNode<H> {
    fn new(key: char, depth: usize) -> Self {
        Self {
            key,
            depth,
            children: Vec::new(),
            leaf: None,
        }
    }

    /// The path character this node represents.
    #[must_use]
    pub fn key(&self) -> char {
        self.key
    }

    /// Distance from the root; the root itself has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child nodes in insertion order.
    #[must_use]
    pub fn children(&self) -> &[TreeNode<H>] {
        &self.children
    }

    /// Child reached through `key`, if any.
    #[must_use]
    pub fn child(&self, key: char) -> Option<&TreeNode<H>> {
        self.children.iter().find(|child| child.key == key)
    }

    /// Route stored here; `None` for intermediate nodes.
    #[must_use]
    pub fn route(&self) -> Option<&Route<H>> {
        self.leaf.as_ref()
    }

    /// Whether a route ends at this node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// Stored path of the route ending here.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.leaf.as_ref().map(|route| route.path.as_str())
    }

    fn child_or_insert(&mut self, key: char, created: &mut usize) -> &mut TreeNode<H> {
        let index = match self.children.iter().position(|child| child.key == key) {
            Some(index) => index,
            None => {
                self.children.push(TreeNode::new(key, self.depth + 1));
                *created += 1;
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// Prefix tree of the routes registered for one HTTP method.
///
/// Built during setup and read-only afterwards. The tree has no interior
/// mutability, so `&PathTree` can be shared freely between request threads.
#[derive(Debug, Clone)]
pub struct PathTree<H> {
    root: TreeNode<H>,
    size: usize,
    next_order: usize,
}

impl<H> Default for PathTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> PathTree<H> {
    /// Tree holding only the `/` root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: TreeNode::new('/', 1),
            size: 1,
            next_order: 0,
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &TreeNode<H> {
        &self.root
    }

    /// Total number of nodes, root included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_order
    }

    /// True when no route has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_order == 0
    }

    /// Insert `path`, creating one node per character not already present.
    ///
    /// Adding a path that is already registered replaces its handler and group
    /// prefixes but keeps its original position in [`leaves`](Self::leaves).
    pub fn add(&mut self, path: &str, handler: H, group_prefixes: Arc<[Arc<str>]>) {
        let stripped = path.strip_prefix('/').unwrap_or(path);

        let mut created = 0;
        let mut node = &mut self.root;
        for c in stripped.chars() {
            node = node.child_or_insert(c, &mut created);
        }
        self.size += created;

        let order = match &node.leaf {
            Some(existing) => existing.order,
            None => {
                let order = self.next_order;
                self.next_order += 1;
                order
            }
        };
        node.leaf = Some(Route {
            path: format!("/{stripped}"),
            handler,
            group_prefixes,
            order,
        });
    }

    /// Find the nodes relevant to `key`.
    ///
    /// Returns the single exact leaf when one exists on the walk, every leaf
    /// below the end of the walk otherwise, and nothing when `key` leaves the
    /// tree.
    #[must_use]
    pub fn find(&self, key: &str) -> Vec<&TreeNode<H>> {
        if self.root.path() == Some(key) {
            return vec![&self.root];
        }

        let mut node = &self.root;
        for c in key.strip_prefix('/').unwrap_or(key).chars() {
            let Some(child) = node.child(c) else {
                return Vec::new();
            };
            if child.path() == Some(key) {
                return vec![child];
            }
            node = child;
        }

        collect_leaves(node)
    }

    /// Every route in the tree, in registration order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Route<H>> {
        let mut routes: Vec<&Route<H>> = collect_leaves(&self.root)
            .into_iter()
            .filter_map(TreeNode::route)
            .collect();
        routes.sort_by_key(|route| route.order);
        routes
    }
}

/// Breadth-first collection of every leaf at or below `start`.
fn collect_leaves<H>(start: &TreeNode<H>) -> Vec<&TreeNode<H>> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if node.is_leaf() {
            found.push(node);
        }
        queue.extend(node.children.iter());
    }
    found
}
