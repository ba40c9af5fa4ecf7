//! Reading identity and labels out of a resource manifest.

use super::error::ItemError;
use super::includes::Includes;
use super::key::Scope;
use super::resource_set::ResourceSet;
use super::selector::LabelSelector;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// GroupVersionKind is the fully-qualified type of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        GroupVersionKind {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Parses an `apiVersion` of the form `version` or `group/version`.
    pub fn from_api_version(api_version: &str, kind: &str) -> Result<Self, String> {
        if api_version.is_empty() {
            return Err("missing apiVersion".to_string());
        }
        match api_version.split('/').collect::<Vec<_>>().as_slice() {
            [version] => Ok(GroupVersionKind::new("", *version, kind)),
            [group, version] => Ok(GroupVersionKind::new(*group, *version, kind)),
            _ => Err(format!("unexpected GroupVersion string: {}", api_version)),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

/// Manifest is a borrowed view of one decoded resource.
pub struct Manifest<'a> {
    object: &'a Value,
}

impl<'a> Manifest<'a> {
    pub fn new(object: &'a Value) -> Self {
        Manifest { object }
    }

    fn string_field(&self, dotted: &str) -> Option<&'a str> {
        self.object.lookup(dotted).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.string_field("metadata.name").filter(|n| !n.is_empty())
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.string_field("metadata.namespace")
    }

    pub fn gvk(&self) -> Result<GroupVersionKind, String> {
        let api_version = self.string_field("apiVersion").unwrap_or_default();
        let kind = self.string_field("kind").unwrap_or_default();
        GroupVersionKind::from_api_version(api_version, kind)
    }

    /// Returns `metadata.labels`; non-string label values are ignored.
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.object
            .lookup("metadata.labels")
            .and_then(Value::as_map)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Adds a decoded manifest to `resources` if it passes the scope filter and
/// the selector.
///
/// `scope` overrides the scope read from `metadata.namespace`; archive
/// sources know the scope from the entry's location instead.
pub(crate) fn add_manifest(
    resources: &mut ResourceSet,
    object: Value,
    scope: Option<Scope>,
    scopes: &Includes,
    selector: &LabelSelector,
    location: &str,
) -> Result<(), ItemError> {
    let manifest = Manifest::new(&object);
    let scope = scope.unwrap_or_else(|| Scope::from_namespace(manifest.namespace()));

    if !scopes.includes_scope(&scope) {
        return Ok(());
    }
    if !selector.matches(&manifest.labels()) {
        return Ok(());
    }

    let gvk = manifest.gvk().map_err(|reason| ItemError::Invalid {
        location: location.to_string(),
        reason,
    })?;
    let name = manifest
        .name()
        .ok_or_else(|| ItemError::Invalid {
            location: location.to_string(),
            reason: "missing metadata.name".to_string(),
        })?
        .to_string();

    resources.add(scope, gvk.to_string(), name, object);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gvk_display() {
        assert_eq!(
            GroupVersionKind::from_api_version("apps/v1", "Deployment")
                .unwrap()
                .to_string(),
            "apps/v1, Kind=Deployment"
        );
        assert_eq!(
            GroupVersionKind::from_api_version("v1", "Pod").unwrap().to_string(),
            "/v1, Kind=Pod"
        );
        assert!(GroupVersionKind::from_api_version("a/b/c", "X").is_err());
        assert!(GroupVersionKind::from_api_version("", "X").is_err());
    }

    #[test]
    fn test_manifest_fields() {
        let object = from_yaml(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm1\n  namespace: default\n  labels:\n    app: web\n    replicas: 3\n",
        )
        .unwrap();
        let manifest = Manifest::new(&object);
        assert_eq!(manifest.name(), Some("cm1"));
        assert_eq!(manifest.namespace(), Some("default"));
        assert_eq!(manifest.gvk().unwrap(), GroupVersionKind::new("", "v1", "ConfigMap"));
        assert_eq!(
            manifest.labels(),
            BTreeMap::from([("app".to_string(), "web".to_string())])
        );
    }

    #[test]
    fn test_add_manifest_filters() {
        let object = from_yaml("apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\n  namespace: default\n").unwrap();

        let mut resources = ResourceSet::new();
        add_manifest(
            &mut resources,
            object.clone(),
            None,
            &Includes::new(["cluster"]),
            &LabelSelector::everything(),
            "p.yaml",
        )
        .unwrap();
        assert!(resources.is_empty());

        add_manifest(
            &mut resources,
            object,
            None,
            &Includes::all(),
            &LabelSelector::everything(),
            "p.yaml",
        )
        .unwrap();
        assert!(resources
            .get(&Scope::Namespace("default".into()), "/v1, Kind=Pod", "p")
            .is_some());
    }

    #[test]
    fn test_add_manifest_missing_name() {
        let object = from_yaml("apiVersion: v1\nkind: Pod\nmetadata: {}\n").unwrap();
        let mut resources = ResourceSet::new();
        let err = add_manifest(
            &mut resources,
            object,
            None,
            &Includes::all(),
            &LabelSelector::everything(),
            "p.yaml",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "p.yaml: missing metadata.name");
    }
}
