//! Policy file loading.
//!
//! A policy file is TOML describing default state, extra permission sets,
//! request-level context and a set of named objects:
//!
//! ```toml
//! [defaults]
//! state = "deny"
//!
//! [permission_sets]
//! docs = ["doc.read", "doc.list"]
//!
//! [context]
//! user = { name = "alice", groups = ["wheel"] }
//!
//! [objects.site]
//! acl = "ALLOW WHEEL ALL"
//! context = { tenant = "acme" }
//!
//! [objects.page]
//! bases = ["site"]
//! acl = "DENY ANONYMOUS ALL"
//! ```
//!
//! Objects become [`AclNode`]s with bases resolved by name. Unknown bases and
//! inheritance cycles are rejected here; ACL text is not parsed until it is
//! checked or linted.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use gatehouse_acl::{
    AceEntry, AclChunk, AclManager, AclNode, AclSource, Context, PermissionSet, Registry,
    parse_state,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// Environment variable consulted when `--policy` is not given.
pub const POLICY_ENV: &str = "GATEHOUSE_POLICY";

// ============================================================================
// File schema
// ============================================================================

/// Top-level policy file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Host defaults.
    pub defaults: DefaultsConfig,
    /// Additional named permission sets.
    pub permission_sets: BTreeMap<String, Vec<String>>,
    /// Context supplied to every check.
    pub context: Context,
    /// Protected objects by name.
    pub objects: BTreeMap<String, ObjectConfig>,
}

/// `[defaults]` table.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// State token used when an ACL is undetermined.
    pub state: Option<String>,
}

/// One `[objects.<name>]` table.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectConfig {
    /// Names of objects inherited from, in priority order.
    pub bases: Vec<String>,
    /// The object's own ACL.
    pub acl: Option<AclConfig>,
    /// The object's own context.
    pub context: Context,
}

/// ACL given either as one text block or as a list of items.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AclConfig {
    /// Line-oriented ACE text.
    Text(String),
    /// Mixed text and structural entries.
    Items(Vec<AclItem>),
}

/// An element of a list-form ACL.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AclItem {
    /// Line-oriented ACE text.
    Text(String),
    /// A structural entry; the permission is compared literally.
    Entry {
        /// Boolean or state token.
        state: Value,
        /// Predicate token.
        predicate: String,
        /// Permission string, or an array of permissions.
        permission: Value,
    },
}

impl From<AclConfig> for AclSource {
    fn from(config: AclConfig) -> Self {
        match config {
            AclConfig::Text(text) => AclSource::from(text),
            AclConfig::Items(items) => items.into_iter().map(AclChunk::from).collect(),
        }
    }
}

impl From<AclItem> for AclChunk {
    fn from(item: AclItem) -> Self {
        match item {
            AclItem::Text(text) => AclChunk::Text(text),
            AclItem::Entry {
                state,
                predicate,
                permission,
            } => AclChunk::Entry(AceEntry::new(state, predicate, permission)),
        }
    }
}

// ============================================================================
// Loaded policy
// ============================================================================

/// A policy ready to answer checks.
#[derive(Debug)]
pub struct Policy {
    registry: Registry,
    default_state: Option<bool>,
    context: Context,
    objects: BTreeMap<String, Arc<AclNode>>,
}

impl Policy {
    /// Read and build a policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        tracing::debug!(path = %path.display(), "loading policy");
        Self::from_toml(&text)
    }

    /// Build a policy from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: PolicyConfig = toml::from_str(text)?;
        Self::from_config(config)
    }

    /// Build a policy from a parsed file.
    pub fn from_config(config: PolicyConfig) -> Result<Self> {
        let default_state = config
            .defaults
            .state
            .as_deref()
            .map(parse_state)
            .transpose()?;

        let mut registry = Registry::with_defaults();
        for (name, members) in &config.permission_sets {
            registry.register_permission_set(name.as_str(), PermissionSet::members(members));
        }

        let mut objects = BTreeMap::new();
        for name in config.objects.keys() {
            build_node(name, &config.objects, &mut objects, &mut Vec::new())?;
        }
        tracing::debug!(
            objects = objects.len(),
            permission_sets = config.permission_sets.len(),
            "policy built"
        );

        Ok(Self {
            registry,
            default_state,
            context: config.context,
            objects,
        })
    }

    /// The registry with the policy's permission sets added.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The `[defaults] state`, if any.
    pub fn default_state(&self) -> Option<bool> {
        self.default_state
    }

    /// The `[context]` table.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Look up an object by name.
    pub fn object(&self, name: &str) -> Result<&Arc<AclNode>> {
        self.objects
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.to_string()))
    }

    /// All objects, sorted by name.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &Arc<AclNode>)> {
        self.objects.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// A manager whose context processor supplies the `[context]` table.
    pub fn manager(&self) -> AclManager {
        let context = self.context.clone();
        let mut manager = AclManager::with_registry(self.registry.clone());
        manager
            .context_processor(move || context.clone())
            .set_default_state(self.default_state);
        manager
    }
}

fn build_node(
    name: &str,
    objects: &BTreeMap<String, ObjectConfig>,
    built: &mut BTreeMap<String, Arc<AclNode>>,
    path: &mut Vec<String>,
) -> Result<Arc<AclNode>> {
    if let Some(node) = built.get(name) {
        return Ok(node.clone());
    }
    if path.iter().any(|n| n == name) {
        path.push(name.to_string());
        return Err(Error::config(format!(
            "inheritance cycle: {}",
            path.join(" -> ")
        )));
    }
    let Some(object) = objects.get(name) else {
        return Err(match path.last() {
            Some(child) => Error::config(format!("'{child}' names unknown base '{name}'")),
            None => Error::UnknownObject(name.to_string()),
        });
    };

    path.push(name.to_string());
    let mut node = AclNode::new(name).with_context(object.context.clone());
    if let Some(acl) = &object.acl {
        node = node.with_acl(acl.clone());
    }
    for base in &object.bases {
        node = node.with_base(build_node(base, objects, built, path)?);
    }
    path.pop();

    let node = Arc::new(node);
    built.insert(name.to_string(), node.clone());
    Ok(node)
}
