//! Binary-tree rectangle packing with a growing canvas.
//!
//! Rectangles are placed largest first into a tree of free regions. When no
//! free region fits, the canvas grows right or down, whichever keeps it closer
//! to square.

use std::cmp::Reverse;

/// A rectangle to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackItem {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Where an item ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A packed canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

struct Packer {
    nodes: Vec<Node>,
    root: usize,
}

impl Packer {
    fn new(w: u32, h: u32) -> Self {
        Self {
            nodes: vec![Node::free(0, 0, w, h)],
            root: 0,
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn find(&self, from: usize, w: u32, h: u32) -> Option<usize> {
        let node = self.nodes[from];
        if node.used {
            node.right
                .and_then(|r| self.find(r, w, h))
                .or_else(|| node.down.and_then(|d| self.find(d, w, h)))
        } else if w <= node.w && h <= node.h {
            Some(from)
        } else {
            None
        }
    }

    fn split(&mut self, index: usize, w: u32, h: u32) -> (u32, u32) {
        let node = self.nodes[index];
        let down = self.push(Node::free(node.x, node.y + h, node.w, node.h - h));
        let right = self.push(Node::free(node.x + w, node.y, node.w - w, h));
        let node = &mut self.nodes[index];
        node.used = true;
        node.down = Some(down);
        node.right = Some(right);
        (node.x, node.y)
    }

    fn grow(&mut self, w: u32, h: u32) -> (u32, u32) {
        let root = self.nodes[self.root];
        let can_grow_down = w <= root.w;
        let can_grow_right = h <= root.h;
        let should_grow_right = can_grow_right && root.h >= root.w + w;
        let should_grow_down = can_grow_down && root.w >= root.h + h;

        if should_grow_right || (can_grow_right && !should_grow_down) {
            self.grow_right(w, h)
        } else {
            self.grow_down(w, h)
        }
    }

    fn grow_right(&mut self, w: u32, h: u32) -> (u32, u32) {
        let old = self.nodes[self.root];
        let right = self.push(Node::free(old.w, 0, w, old.h));
        let root = self.push(Node {
            used: true,
            right: Some(right),
            down: Some(self.root),
            ..Node::free(0, 0, old.w + w, old.h)
        });
        self.root = root;
        self.place_in_tree(w, h)
    }

    fn grow_down(&mut self, w: u32, h: u32) -> (u32, u32) {
        let old = self.nodes[self.root];
        let width = old.w.max(w);
        let down = self.push(Node::free(0, old.h, width, h));
        let root = self.push(Node {
            used: true,
            right: Some(self.root),
            down: Some(down),
            ..Node::free(0, 0, width, old.h + h)
        });
        self.root = root;
        self.place_in_tree(w, h)
    }

    /// Place into an existing free region. Only called right after growing,
    /// when a region of exactly the right size exists.
    fn place_in_tree(&mut self, w: u32, h: u32) -> (u32, u32) {
        match self.find(self.root, w, h) {
            Some(index) => self.split(index, w, h),
            None => (0, self.nodes[self.root].h),
        }
    }

    fn place(&mut self, w: u32, h: u32) -> (u32, u32) {
        match self.find(self.root, w, h) {
            Some(index) => self.split(index, w, h),
            None => self.grow(w, h),
        }
    }
}

/// Pack `items`, leaving `padding` pixels right of and below every item.
///
/// Items are placed in order of descending longest side, ties broken by name,
/// so the layout only depends on the set of items.
pub fn pack(items: &[PackItem], padding: u32) -> Layout {
    let mut sorted: Vec<&PackItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        Reverse(a.width.max(a.height))
            .cmp(&Reverse(b.width.max(b.height)))
            .then_with(|| a.name.cmp(&b.name))
    });

    let Some(first) = sorted.first() else {
        return Layout::default();
    };

    let mut packer = Packer::new(first.width + padding, first.height + padding);
    let mut layout = Layout::default();

    for item in sorted {
        let (x, y) = packer.place(item.width + padding, item.height + padding);
        layout.width = layout.width.max(x + item.width);
        layout.height = layout.height.max(y + item.height);
        layout.placements.push(Placement {
            name: item.name.clone(),
            x,
            y,
            width: item.width,
            height: item.height,
        });
    }

    layout
}
