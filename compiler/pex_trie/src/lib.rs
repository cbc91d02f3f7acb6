//! Pex Trie - longest-prefix dispatch table.
//!
//! A radix tree over UTF-8 bytes. Each entry is either *exact* (matches only
//! the whole key) or *prefix* (matches any key starting with it). A lookup
//! returns the most specific entry together with the number of bytes it
//! matched, so the caller can treat `key[matched_len..]` as a
//! self-delimited argument string:
//!
//! ```text
//! table.insert_prefix("=upper", upper);
//! let m = table.lookup("=upper:%foo").unwrap();   // m.matched_len == 6
//! // arguments: ":%foo", separator ':'
//! ```
//!
//! Nodes live in an arena and refer to each other by `u32` index. The table
//! is built once and then only read; it is `Sync` whenever `V` is.

use smallvec::SmallVec;

/// Whether an entry matches the whole key or any key it prefixes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Exact,
    Prefix,
}

/// Result of a successful [`PrefixTable::lookup`].
#[derive(Debug)]
pub struct Match<'t, V> {
    pub value: &'t V,
    /// Bytes of the key consumed by the entry. Always a char boundary.
    pub matched_len: usize,
    pub kind: EntryKind,
}

#[derive(Clone, Debug)]
struct Node {
    /// Edge label leading into this node; empty only for the root.
    fragment: Box<[u8]>,
    /// Children, sorted by the first byte of their fragment.
    children: SmallVec<[u32; 4]>,
    exact: Option<u32>,
    prefix: Option<u32>,
}

impl Node {
    fn new(fragment: &[u8]) -> Self {
        Node {
            fragment: fragment.into(),
            children: SmallVec::new(),
            exact: None,
            prefix: None,
        }
    }
}

/// Radix tree mapping string keys to values with longest-prefix lookup.
#[derive(Clone, Debug)]
pub struct PrefixTable<V> {
    nodes: Vec<Node>,
    values: Vec<V>,
}

impl<V> Default for PrefixTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixTable<V> {
    pub fn new() -> Self {
        PrefixTable {
            nodes: vec![Node::new(&[])],
            values: Vec::new(),
        }
    }

    /// Number of entries (exact and prefix).
    pub fn len(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| usize::from(n.exact.is_some()) + usize::from(n.prefix.is_some()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add an entry matching only `key` itself. Returns the replaced value.
    pub fn insert_exact(&mut self, key: &str, value: V) -> Option<V> {
        self.insert(key, EntryKind::Exact, value)
    }

    /// Add an entry matching every key that starts with `key`.
    pub fn insert_prefix(&mut self, key: &str, value: V) -> Option<V> {
        self.insert(key, EntryKind::Prefix, value)
    }

    pub fn insert(&mut self, key: &str, kind: EntryKind, value: V) -> Option<V> {
        let node = self.node_for_insert(key.as_bytes());
        let slot = match kind {
            EntryKind::Exact => self.nodes[node].exact,
            EntryKind::Prefix => self.nodes[node].prefix,
        };
        if let Some(idx) = slot {
            return Some(std::mem::replace(&mut self.values[idx as usize], value));
        }
        let idx = self.values.len() as u32;
        self.values.push(value);
        match kind {
            EntryKind::Exact => self.nodes[node].exact = Some(idx),
            EntryKind::Prefix => self.nodes[node].prefix = Some(idx),
        }
        None
    }

    /// Walk (and split) the tree until a node spelling exactly `key` exists.
    fn node_for_insert(&mut self, key: &[u8]) -> usize {
        let mut node = 0;
        let mut rest = key;
        while let Some(&first) = rest.first() {
            let Some(pos) = self.child_position(node, first) else {
                let child = self.push_node(Node::new(rest));
                let at = self.insertion_point(node, first);
                self.nodes[node].children.insert(at, child as u32);
                return child;
            };
            let child = self.nodes[node].children[pos] as usize;
            let common = common_prefix_len(&self.nodes[child].fragment, rest);
            if common < self.nodes[child].fragment.len() {
                // Split: node -> mid(fragment[..common]) -> child(fragment[common..])
                let fragment = std::mem::take(&mut self.nodes[child].fragment);
                let mut mid = Node::new(&fragment[..common]);
                mid.children.push(child as u32);
                self.nodes[child].fragment = fragment[common..].into();
                let mid = self.push_node(mid);
                self.nodes[node].children[pos] = mid as u32;
                node = mid;
            } else {
                node = child;
            }
            rest = &rest[common..];
        }
        node
    }

    fn push_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn child_position(&self, node: usize, first: u8) -> Option<usize> {
        self.nodes[node]
            .children
            .binary_search_by_key(&first, |&c| self.nodes[c as usize].fragment[0])
            .ok()
    }

    fn insertion_point(&self, node: usize, first: u8) -> usize {
        self.nodes[node]
            .children
            .partition_point(|&c| self.nodes[c as usize].fragment[0] < first)
    }

    /// Most specific entry matching `key`: the longest prefix entry, or an
    /// exact entry when the whole key is spelled by one.
    pub fn lookup(&self, key: &str) -> Option<Match<'_, V>> {
        let bytes = key.as_bytes();
        let mut node = 0;
        let mut consumed = 0;
        let mut best = None;
        loop {
            let n = &self.nodes[node];
            if consumed == bytes.len() {
                if let Some(idx) = n.exact {
                    return Some(self.make_match(idx, consumed, EntryKind::Exact));
                }
            }
            if let Some(idx) = n.prefix {
                best = Some((idx, consumed));
            }
            let Some(&first) = bytes.get(consumed) else {
                break;
            };
            let Some(pos) = self.child_position(node, first) else {
                break;
            };
            let child = n.children[pos] as usize;
            if !bytes[consumed..].starts_with(&self.nodes[child].fragment) {
                break;
            }
            consumed += self.nodes[child].fragment.len();
            node = child;
        }
        best.map(|(idx, len)| self.make_match(idx, len, EntryKind::Prefix))
    }

    /// Value of the exact entry for `key`, ignoring prefix entries.
    pub fn get_exact(&self, key: &str) -> Option<&V> {
        let node = self.find_node(key.as_bytes())?;
        self.nodes[node].exact.map(|idx| &self.values[idx as usize])
    }

    fn find_node(&self, key: &[u8]) -> Option<usize> {
        let mut node = 0;
        let mut rest = key;
        while let Some(&first) = rest.first() {
            let child = self.nodes[node].children[self.child_position(node, first)?] as usize;
            rest = rest.strip_prefix(&*self.nodes[child].fragment)?;
            node = child;
        }
        Some(node)
    }

    fn make_match(&self, idx: u32, matched_len: usize, kind: EntryKind) -> Match<'_, V> {
        Match {
            value: &self.values[idx as usize],
            matched_len,
            kind,
        }
    }

    /// All entry keys in byte order, with their kind.
    pub fn keys(&self) -> Vec<(String, EntryKind)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_keys(0, &mut path, &mut out);
        out
    }

    fn collect_keys(&self, node: usize, path: &mut Vec<u8>, out: &mut Vec<(String, EntryKind)>) {
        let n = &self.nodes[node];
        path.extend_from_slice(&n.fragment);
        if n.exact.is_some() {
            out.push((String::from_utf8_lossy(&path[..]).into_owned(), EntryKind::Exact));
        }
        if n.prefix.is_some() {
            out.push((String::from_utf8_lossy(&path[..]).into_owned(), EntryKind::Prefix));
        }
        for &child in &n.children {
            self.collect_keys(child as usize, path, out);
        }
        path.truncate(path.len() - n.fragment.len());
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
