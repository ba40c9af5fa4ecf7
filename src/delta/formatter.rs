//! Line-oriented rendering of a [`Diff`] against its base payload.

use super::{Change, Diff};
use crate::fieldpath::{Path, PathElement};
use crate::value::Value;
use nu_ansi_term::Color;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while formatting a diff.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("encoding value at {path}: {source}")]
    Encode {
        path: Path,
        #[source]
        source: serde_json::Error,
    },
}

/// Marker column of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Unchanged,
    Added,
    Removed,
}

impl Marker {
    fn symbol(self) -> char {
        match self {
            Marker::Unchanged => ' ',
            Marker::Added => '+',
            Marker::Removed => '-',
        }
    }
}

/// A child of a container being rendered: either present in the base or
/// only known through an addition.
enum Child<'a> {
    Base(&'a Value),
    Added(&'a Value),
}

/// AsciiFormatter prints the base payload as indented JSON with a marker
/// column: `-` for removed or old values, `+` for added or new values and a
/// blank for everything unchanged.
pub struct AsciiFormatter<'a> {
    base: &'a Value,
    coloring: bool,
}

impl<'a> AsciiFormatter<'a> {
    pub fn new(base: &'a Value, coloring: bool) -> Self {
        AsciiFormatter { base, coloring }
    }

    /// Renders `diff`, which must have been computed with this formatter's
    /// base as its left-hand side.
    pub fn format(&self, diff: &Diff) -> Result<String, FormatError> {
        let mut render = Render {
            changes: HashMap::new(),
            additions: HashMap::new(),
            coloring: self.coloring,
            out: String::new(),
        };

        for delta in diff.deltas() {
            if let (Change::Added(value), Some(parent), Some(element)) =
                (&delta.change, delta.path.parent(), delta.path.last())
            {
                render
                    .additions
                    .entry(parent)
                    .or_default()
                    .push((element, value));
            } else {
                render.changes.insert(&delta.path, &delta.change);
            }
        }

        let mut path = Path::new();
        render.walk(self.base, &mut path, None, 0, false)?;
        Ok(render.out)
    }
}

struct Render<'d> {
    changes: HashMap<&'d Path, &'d Change>,
    additions: HashMap<Path, Vec<(&'d PathElement, &'d Value)>>,
    coloring: bool,
    out: String,
}

impl<'d> Render<'d> {
    fn walk(
        &mut self,
        node: &'d Value,
        path: &mut Path,
        label: Option<String>,
        depth: usize,
        comma: bool,
    ) -> Result<(), FormatError> {
        if let Some(change) = self.changes.get(&*path).copied() {
            match change {
                Change::Modified { old, new } => {
                    self.write_value(Marker::Removed, path, label.clone(), old, depth, comma)?;
                    self.write_value(Marker::Added, path, label, new, depth, comma)?;
                }
                Change::Removed(value) => {
                    self.write_value(Marker::Removed, path, label, value, depth, comma)?;
                }
                Change::Added(value) => {
                    self.write_value(Marker::Added, path, label, value, depth, comma)?;
                }
            }
            return Ok(());
        }

        let added = self.additions.get(&*path).cloned().unwrap_or_default();
        let prefix = label.unwrap_or_default();

        match node {
            Value::Map(map) if !map.is_empty() || !added.is_empty() => {
                let mut children: Vec<(&str, Child<'d>)> = map
                    .iter()
                    .map(|(name, value)| (name.as_str(), Child::Base(value)))
                    .collect();
                for (element, value) in added {
                    if let Some(name) = element.as_field_name() {
                        children.push((name, Child::Added(value)));
                    }
                }
                children.sort_by(|a, b| a.0.cmp(b.0));

                self.line(Marker::Unchanged, depth, &format!("{}{{", prefix));
                let count = children.len();
                for (i, (name, child)) in children.into_iter().enumerate() {
                    let child_label = Some(key_label(name, path)?);
                    let child_comma = i + 1 < count;
                    path.push(PathElement::field_name(name));
                    let result = match child {
                        Child::Base(value) => {
                            self.walk(value, path, child_label, depth + 1, child_comma)
                        }
                        Child::Added(value) => self.write_value(
                            Marker::Added,
                            path,
                            child_label,
                            value,
                            depth + 1,
                            child_comma,
                        ),
                    };
                    path.pop();
                    result?;
                }
                self.line(Marker::Unchanged, depth, &close("}", comma));
            }
            Value::List(items) if !items.is_empty() || !added.is_empty() => {
                let mut children: Vec<(usize, Child<'d>)> = items
                    .iter()
                    .enumerate()
                    .map(|(i, value)| (i, Child::Base(value)))
                    .collect();
                for (element, value) in added {
                    if let PathElement::Index(i) = element {
                        children.push((*i, Child::Added(value)));
                    }
                }
                children.sort_by_key(|(i, _)| *i);

                self.line(Marker::Unchanged, depth, &format!("{}[", prefix));
                let count = children.len();
                for (n, (i, child)) in children.into_iter().enumerate() {
                    let child_comma = n + 1 < count;
                    path.push(PathElement::index(i));
                    let result = match child {
                        Child::Base(value) => self.walk(value, path, None, depth + 1, child_comma),
                        Child::Added(value) => {
                            self.write_value(Marker::Added, path, None, value, depth + 1, child_comma)
                        }
                    };
                    path.pop();
                    result?;
                }
                self.line(Marker::Unchanged, depth, &close("]", comma));
            }
            _ => {
                self.write_value(Marker::Unchanged, path, Some(prefix), node, depth, comma)?;
            }
        }

        Ok(())
    }

    /// Writes a whole subtree under a single marker.
    fn write_value(
        &mut self,
        marker: Marker,
        path: &Path,
        label: Option<String>,
        value: &Value,
        depth: usize,
        comma: bool,
    ) -> Result<(), FormatError> {
        let prefix = label.unwrap_or_default();
        match value {
            Value::Map(map) if !map.is_empty() => {
                self.line(marker, depth, &format!("{}{{", prefix));
                let count = map.len();
                for (i, (name, child)) in map.iter().enumerate() {
                    let child_path = path.with(PathElement::field_name(name.clone()));
                    let child_label = Some(key_label(name, &child_path)?);
                    self.write_value(marker, &child_path, child_label, child, depth + 1, i + 1 < count)?;
                }
                self.line(marker, depth, &close("}", comma));
            }
            Value::List(items) if !items.is_empty() => {
                self.line(marker, depth, &format!("{}[", prefix));
                let count = items.len();
                for (i, child) in items.iter().enumerate() {
                    let child_path = path.with(PathElement::index(i));
                    self.write_value(marker, &child_path, None, child, depth + 1, i + 1 < count)?;
                }
                self.line(marker, depth, &close("]", comma));
            }
            scalar => {
                let encoded = serde_json::to_string(scalar).map_err(|source| FormatError::Encode {
                    path: path.clone(),
                    source,
                })?;
                self.line(marker, depth, &format!("{}{}{}", prefix, encoded, if comma { "," } else { "" }));
            }
        }
        Ok(())
    }

    fn line(&mut self, marker: Marker, depth: usize, text: &str) {
        let line = format!("{} {}{}", marker.symbol(), "  ".repeat(depth), text);
        let painted = match (self.coloring, marker) {
            (true, Marker::Added) => Color::Green.paint(line).to_string(),
            (true, Marker::Removed) => Color::Red.paint(line).to_string(),
            _ => line,
        };
        self.out.push_str(&painted);
        self.out.push('\n');
    }
}

fn key_label(name: &str, path: &Path) -> Result<String, FormatError> {
    let quoted = serde_json::to_string(name).map_err(|source| FormatError::Encode {
        path: path.clone(),
        source,
    })?;
    Ok(format!("{}: ", quoted))
}

fn close(bracket: &str, comma: bool) -> String {
    if comma {
        format!("{},", bracket)
    } else {
        bracket.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::compare;
    use crate::value::from_json;
    use pretty_assertions::assert_eq;

    fn render(lhs: &str, rhs: &str, coloring: bool) -> String {
        let lhs = from_json(lhs).unwrap();
        let rhs = from_json(rhs).unwrap();
        let diff = compare(&lhs, &rhs);
        AsciiFormatter::new(&lhs, coloring).format(&diff).unwrap()
    }

    #[test]
    fn test_format_modified_field() {
        let text = render(
            r#"{"kind":"ConfigMap","data":{"a":"1","b":"2"}}"#,
            r#"{"kind":"ConfigMap","data":{"a":"1","b":"3"}}"#,
            false,
        );
        let expected = "  {\n\
                        \x20   \"data\": {\n\
                        \x20     \"a\": \"1\",\n\
                        -     \"b\": \"2\"\n\
                        +     \"b\": \"3\"\n\
                        \x20   },\n\
                        \x20   \"kind\": \"ConfigMap\"\n\
                        \x20 }\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_added_and_removed() {
        let text = render(
            r#"{"items":[1],"old":{"x":true}}"#,
            r#"{"items":[1,2],"new":null}"#,
            false,
        );
        let expected = "  {\n\
                        \x20   \"items\": [\n\
                        \x20     1,\n\
                        +     2\n\
                        \x20   ],\n\
                        +   \"new\": null,\n\
                        -   \"old\": {\n\
                        -     \"x\": true\n\
                        -   }\n\
                        \x20 }\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_unchanged_has_no_markers() {
        let text = render(r#"{"a":[],"b":{}}"#, r#"{"a":[],"b":{}}"#, false);
        assert_eq!(text, "  {\n    \"a\": [],\n    \"b\": {}\n  }\n");
    }

    #[test]
    fn test_format_coloring() {
        let plain = render(r#"{"a":1}"#, r#"{"a":2}"#, false);
        let colored = render(r#"{"a":1}"#, r#"{"a":2}"#, true);
        assert!(!plain.contains('\u{1b}'));
        assert!(colored.contains(&Color::Red.paint("-   \"a\": 1").to_string()));
        assert!(colored.contains(&Color::Green.paint("+   \"a\": 2").to_string()));
    }
}
