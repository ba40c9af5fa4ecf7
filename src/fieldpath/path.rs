//! Path element and path types.

use std::cmp::Ordering;

/// PathElement represents one level of navigation into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// Field name for map fields.
    FieldName(String),
    /// Position inside a list.
    Index(usize),
}

impl PathElement {
    /// Creates a new field name path element.
    pub fn field_name(name: impl Into<String>) -> Self {
        PathElement::FieldName(name.into())
    }

    /// Creates a new index path element.
    pub fn index(i: usize) -> Self {
        PathElement::Index(i)
    }

    /// Returns the field name if this is a field name element.
    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            PathElement::FieldName(name) => Some(name),
            _ => None,
        }
    }
}

impl PartialOrd for PathElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathElement {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PathElement::FieldName(a), PathElement::FieldName(b)) => a.cmp(b),
            (PathElement::Index(a), PathElement::Index(b)) => a.cmp(b),
            // Field names come before indices
            (PathElement::FieldName(_), PathElement::Index(_)) => Ordering::Less,
            (PathElement::Index(_), PathElement::FieldName(_)) => Ordering::Greater,
        }
    }
}

/// Path is the location of a nested field, starting at the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a path from a vector of elements.
    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Path { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.elements.iter()
    }

    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    pub fn pop(&mut self) -> Option<PathElement> {
        self.elements.pop()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Creates a new path with the given element appended.
    pub fn with(&self, element: PathElement) -> Self {
        let mut new_path = self.clone();
        new_path.push(element);
        new_path
    }

    /// Returns the path without its last element, or None for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.elements.split_last()?;
        Some(Path::from_elements(init.to_vec()))
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl std::fmt::Display for PathElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathElement::FieldName(name) => write!(f, ".{}", name),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.elements.is_empty() {
            return write!(f, ".");
        }
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}
