//! Snapshot source backed by a live Kubernetes cluster.

use super::error::{ItemError, SourceError};
use super::includes::Includes;
use super::key::Scope;
use super::manifest::GroupVersionKind;
use super::selector::LabelSelector;
use super::{Listing, ResourceLister};
use crate::value::Value;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, DynamicObject, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    core::TypeMeta,
    discovery::{verbs, ApiResource, Scope as ApiScope},
    Client, Config, Discovery,
};
use tokio::runtime::Runtime;
use tracing::instrument;

/// Cluster lists every listable resource type the API server prefers.
///
/// The kube client is async; this source owns a current-thread runtime and
/// blocks on it so that callers stay synchronous.
pub struct Cluster {
    runtime: Runtime,
    client: Client,
    context: String,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    /// Connects using the kubeconfig at `kubeconfig`. An empty path infers
    /// the configuration from `KUBECONFIG`, the default kubeconfig file or
    /// the in-cluster service account.
    pub fn connect(kubeconfig: &str) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceError::Runtime)?;
        let client = runtime.block_on(build_client(kubeconfig))?;
        let context = if kubeconfig.is_empty() {
            "inferred configuration".to_string()
        } else {
            kubeconfig.to_string()
        };
        tracing::debug!(context = %context, "connected to cluster");
        Ok(Cluster {
            runtime,
            client,
            context,
        })
    }

    async fn list(&self, scopes: &Includes, selector: &LabelSelector) -> Result<Listing, SourceError> {
        let discovery = Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(|e| kube_error("discovering API resources", e))?;

        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let namespaces: Vec<String> = namespaces
            .list(&ListParams::default())
            .await
            .map_err(|e| kube_error("listing namespaces", e))?
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect();

        let list_params = if selector.is_empty() {
            ListParams::default()
        } else {
            ListParams::default().labels(&selector.to_string())
        };

        let mut listing = Listing::default();

        for group in discovery.groups() {
            for (resource, capabilities) in group.recommended_resources() {
                if !capabilities.supports_operation(verbs::LIST) {
                    continue;
                }

                match capabilities.scope {
                    ApiScope::Namespaced => {
                        for namespace in namespaces.iter().filter(|ns| scopes.should_include(ns)) {
                            let api = Api::namespaced_with(self.client.clone(), namespace, &resource);
                            list_into(
                                api,
                                &resource,
                                Scope::Namespace(namespace.clone()),
                                &list_params,
                                &mut listing,
                            )
                            .await;
                        }
                    }
                    ApiScope::Cluster => {
                        if !scopes.includes_scope(&Scope::Cluster) {
                            continue;
                        }
                        let api = Api::all_with(self.client.clone(), &resource);
                        list_into(api, &resource, Scope::Cluster, &list_params, &mut listing).await;
                    }
                }
            }
        }

        tracing::debug!(
            resources = listing.resources.len(),
            errors = listing.errors.len(),
            "listed cluster"
        );
        Ok(listing)
    }
}

impl ResourceLister for Cluster {
    #[instrument(skip_all, fields(context = %self.context))]
    fn list_resources(
        &self,
        scopes: &Includes,
        selector: &LabelSelector,
    ) -> Result<Listing, SourceError> {
        self.runtime.block_on(self.list(scopes, selector))
    }
}

async fn build_client(kubeconfig: &str) -> Result<Client, SourceError> {
    let config = if kubeconfig.is_empty() {
        Config::infer()
            .await
            .map_err(|e| SourceError::Kubeconfig(Box::new(e)))?
    } else {
        let kubeconfig =
            Kubeconfig::read_from(kubeconfig).map_err(|e| SourceError::Kubeconfig(Box::new(e)))?;
        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| SourceError::Kubeconfig(Box::new(e)))?
    };
    Client::try_from(config).map_err(|e| kube_error("creating client", e))
}

/// Lists one resource type in one scope. Failures are recorded against
/// that type and scope only.
async fn list_into(
    api: Api<DynamicObject>,
    resource: &ApiResource,
    scope: Scope,
    params: &ListParams,
    listing: &mut Listing,
) {
    let gvk = GroupVersionKind::new(&resource.group, &resource.version, &resource.kind).to_string();

    let objects = match api.list(params).await {
        Ok(objects) => objects,
        Err(source) => {
            listing.errors.push(ItemError::List {
                resource: gvk,
                scope: scope.to_string(),
                source: Box::new(source),
            });
            return;
        }
    };

    for mut object in objects {
        let Some(name) = object.metadata.name.clone() else {
            listing.errors.push(ItemError::Invalid {
                location: format!("{} in {}", gvk, scope),
                reason: "missing metadata.name".to_string(),
            });
            continue;
        };

        // List responses omit apiVersion and kind on their items.
        object.types = Some(TypeMeta {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
        });

        match serde_json::to_value(&object) {
            Ok(json) => {
                listing
                    .resources
                    .add(scope.clone(), gvk.clone(), name, Value::from(json));
            }
            Err(err) => listing.errors.push(ItemError::Decode {
                location: format!("{} {}/{}", gvk, scope, name),
                message: err.to_string(),
            }),
        }
    }
}

fn kube_error(context: &str, source: kube::Error) -> SourceError {
    SourceError::Kube {
        context: context.to_string(),
        source: Box::new(source),
    }
}
