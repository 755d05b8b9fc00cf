//! Dialect-neutral description of one outgoing query.

use {
    super::expr::{CompositeExpression, CompositeKind, Node},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "desc" | "descending" => Ok(Direction::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        })
    }
}

/// At most one pagination form is active on a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    Page { page: u64, per_page: u64 },
    Offset { limit: u64, offset: u64 },
    Marker { limit: u64, marker: String },
}

impl Pagination {
    pub fn limit(&self) -> u64 {
        match self {
            Pagination::Page { per_page, .. } => *per_page,
            Pagination::Offset { limit, .. } | Pagination::Marker { limit, .. } => *limit,
        }
    }
}

/// One node of an include tree: `account.owner` and `account.plan` become
/// `account { owner, plan }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludePath {
    pub name: String,
    pub nested: Vec<IncludePath>,
}

impl IncludePath {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: Vec::new(),
        }
    }

    /// Build a forest from dot-paths. Empty segments are ignored and shared
    /// prefixes are merged, keeping first-seen order.
    pub fn parse_all<S: AsRef<str>>(paths: &[S]) -> Vec<IncludePath> {
        let mut roots: Vec<IncludePath> = Vec::new();
        for path in paths {
            let segments: Vec<&str> = path
                .as_ref()
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            insert(&mut roots, &segments);
        }
        roots
    }

    /// Dot-paths below this node, relative to it (`owner`, `plan.tier`).
    pub fn nested_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for child in &self.nested {
            child.flatten_into(String::new(), &mut out);
        }
        out
    }

    /// Dot-paths of this node and everything below it (`account`,
    /// `account.owner`).
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: String, out: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        };
        out.push(path.clone());
        for child in &self.nested {
            child.flatten_into(path.clone(), out);
        }
    }
}

fn insert(level: &mut Vec<IncludePath>, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let idx = match level.iter().position(|p| p.name == *head) {
        Some(idx) => idx,
        None => {
            level.push(IncludePath::new(*head));
            level.len() - 1
        }
    };
    insert(&mut level[idx].nested, rest);
}

/// Filters, sort, pagination and includes for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    filters: Option<CompositeExpression>,
    sort: Vec<(String, Direction)>,
    pagination: Option<Pagination>,
    includes: Vec<String>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> Option<&CompositeExpression> {
        self.filters.as_ref()
    }

    pub fn has_filters(&self) -> bool {
        self.filters.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// AND `node` onto the existing filter.
    pub fn add_filter(&mut self, node: impl Into<Node>) {
        let node = node.into();
        self.filters = Some(match self.filters.take() {
            None => CompositeExpression::and([node]),
            Some(mut root) if root.kind() == CompositeKind::And => {
                root.push(node);
                root
            }
            Some(root) => CompositeExpression::and([Node::from(root), node]),
        });
    }

    /// OR `node` with everything filtered so far.
    pub fn or_filter(&mut self, node: impl Into<Node>) {
        let node = node.into();
        self.filters = Some(match self.filters.take() {
            None => CompositeExpression::or([node]),
            Some(mut root) if root.kind() == CompositeKind::Or => {
                root.push(node);
                root
            }
            Some(root) => CompositeExpression::or([Node::from(root), node]),
        });
    }

    pub fn set_filters(&mut self, filters: Option<CompositeExpression>) {
        self.filters = filters;
    }

    pub fn sort(&self) -> &[(String, Direction)] {
        &self.sort
    }

    pub fn add_sort(&mut self, field: impl Into<String>, direction: Direction) {
        self.sort.push((field.into(), direction));
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn set_pagination(&mut self, pagination: Option<Pagination>) {
        self.pagination = pagination;
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Add a dot-path include. Blank paths and duplicates are ignored.
    pub fn add_include(&mut self, path: impl AsRef<str>) {
        let path = path.as_ref().trim();
        if !path.is_empty() && !self.includes.iter().any(|p| p == path) {
            self.includes.push(path.to_string());
        }
    }

    pub fn include_tree(&self) -> Vec<IncludePath> {
        IncludePath::parse_all(&self.includes)
    }
}
