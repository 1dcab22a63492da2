//! Error Registry
//!
//! Catalog of every error kind the API knows about: the built-in kinds plus
//! the kinds contributed by an optional extension module. Built once at
//! startup and read-only afterwards.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use super::dispatch::DispatchTable;
use super::monitoring::ErrorMonitor;
use crate::extensions::ai::{ALGORITHM_ERROR, MODEL_EXECUTION_ERROR};
use crate::shared::error::{ErrorKind, KindSpec, APPLICATION_ERROR, BUILTIN_KINDS};

/// Kinds whose dispatches are reported to the error monitor, together with
/// all of their sub-kinds.
pub const MONITORED_KINDS: [&str; 2] = [ALGORITHM_ERROR.code, MODEL_EXECUTION_ERROR.code];

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("Extension {extension} failed to declare its kinds: {reason}")]
    Declaration {
        extension: &'static str,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Status {0} is not a client or server error")]
    InvalidStatus(u16),

    #[error("Error code must not be empty")]
    EmptyCode,

    #[error("Error code {0} is reserved for the base application error")]
    ReservedCode(&'static str),

    #[error("Error code {0} is already registered")]
    DuplicateCode(&'static str),

    #[error("Kind {code} declares unknown parent {parent}")]
    UnknownParent {
        code: &'static str,
        parent: &'static str,
    },
}

/// A package contributing additional error kinds at startup.
pub trait ErrorExtension: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Every kind this extension declares. May include the base error.
    fn kinds(&self) -> Result<Vec<KindSpec>, ExtensionError>;
}

/// Collect the strict sub-kinds declared by `extension`.
///
/// Never fails: an absent extension, a declaration error or a panic while
/// declaring all yield an empty set plus a log entry. Declarations that
/// would clash with built-ins, repeat a code or point to an unknown parent
/// are dropped individually. Parents must be declared before their
/// children; a child of a dropped kind is dropped too.
pub fn discover_extension_kinds(extension: Option<&dyn ErrorExtension>) -> Vec<KindSpec> {
    let Some(extension) = extension else {
        tracing::info!("No error extension module configured, using built-in kinds only");
        return Vec::new();
    };

    let declared = match panic::catch_unwind(AssertUnwindSafe(|| extension.kinds())) {
        Ok(Ok(kinds)) => kinds,
        Ok(Err(e)) => {
            tracing::error!(extension = extension.name(), error = %e, "Extension kind discovery failed");
            return Vec::new();
        }
        Err(_) => {
            tracing::error!(extension = extension.name(), "Extension panicked during kind discovery");
            return Vec::new();
        }
    };

    let mut discovered: Vec<KindSpec> = Vec::with_capacity(declared.len());
    for spec in declared.iter().copied() {
        if spec.code == APPLICATION_ERROR.code {
            continue;
        }
        if BUILTIN_KINDS.iter().any(|k| k.code() == spec.code) {
            tracing::warn!(extension = extension.name(), code = spec.code, "Extension kind shadows a built-in kind, skipped");
            continue;
        }
        if discovered.iter().any(|k| k.code == spec.code) {
            tracing::warn!(extension = extension.name(), code = spec.code, "Duplicate extension kind, skipped");
            continue;
        }
        if let Some(parent) = spec.parent {
            let known = parent == APPLICATION_ERROR.code
                || BUILTIN_KINDS.iter().any(|k| k.code() == parent)
                || discovered.iter().any(|k| k.code == parent);
            if !known {
                tracing::warn!(extension = extension.name(), code = spec.code, declared_parent = parent, "Extension kind has an unknown parent, skipped");
                continue;
            }
        }
        discovered.push(spec);
    }

    tracing::info!(
        extension = extension.name(),
        kinds = discovered.len(),
        "Extension error kinds discovered"
    );
    discovered
}

/// Catalog entry exposed by the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KindEntry {
    pub name: &'static str,
    pub code: &'static str,
    pub status: u16,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<&'static str>,
    pub builtin: bool,
}

/// Known error kinds, built-in first, then extension kinds in declaration order.
#[derive(Debug, Clone)]
pub struct ErrorRegistry {
    kinds: Vec<ErrorKind>,
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ErrorRegistry {
    /// Registry holding only the built-in kinds.
    pub fn builtin() -> Self {
        Self {
            kinds: BUILTIN_KINDS.to_vec(),
        }
    }

    /// Built-in kinds plus whatever `extension` declares.
    pub fn with_extension(extension: Option<&dyn ErrorExtension>) -> Self {
        let mut registry = Self::builtin();
        registry
            .kinds
            .extend(discover_extension_kinds(extension).into_iter().map(ErrorKind::Extension));
        registry
    }

    /// Explicitly register an extension kind.
    pub fn register(
        &mut self,
        name: &'static str,
        status: u16,
        code: &'static str,
        template: &'static str,
    ) -> Result<ErrorKind, RegistryError> {
        self.register_spec(KindSpec {
            name,
            code,
            status,
            message: template,
            parent: None,
        })
    }

    /// Register a fully described extension kind.
    pub fn register_spec(&mut self, spec: KindSpec) -> Result<ErrorKind, RegistryError> {
        if !(400..=599).contains(&spec.status) {
            return Err(RegistryError::InvalidStatus(spec.status));
        }
        if spec.code.is_empty() {
            return Err(RegistryError::EmptyCode);
        }
        if spec.code == APPLICATION_ERROR.code {
            return Err(RegistryError::ReservedCode(spec.code));
        }
        if self.lookup(spec.code).is_some() {
            return Err(RegistryError::DuplicateCode(spec.code));
        }
        if let Some(parent) = spec.parent {
            if parent != APPLICATION_ERROR.code && self.lookup(parent).is_none() {
                return Err(RegistryError::UnknownParent {
                    code: spec.code,
                    parent,
                });
            }
        }
        let kind = ErrorKind::Extension(spec);
        self.kinds.push(kind);
        tracing::debug!(code = spec.code, status = spec.status, "Error kind registered");
        Ok(kind)
    }

    pub fn lookup(&self, code: &str) -> Option<ErrorKind> {
        self.kinds.iter().copied().find(|k| k.code() == code)
    }

    pub fn contains(&self, kind: &ErrorKind) -> bool {
        self.lookup(kind.code()).is_some()
    }

    pub fn kinds(&self) -> &[ErrorKind] {
        &self.kinds
    }

    pub fn extension_kinds(&self) -> impl Iterator<Item = KindSpec> + '_ {
        self.kinds.iter().filter_map(|k| match k {
            ErrorKind::Extension(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Codes of `kind` and each of its registered ancestors, nearest first.
    pub fn ancestry(&self, kind: ErrorKind) -> Vec<&'static str> {
        let mut chain = vec![kind.code()];
        let mut parent = kind.spec().parent;
        while let Some(code) = parent {
            // Bounded by the registry size in case of a declaration cycle
            if chain.contains(&code) || chain.len() > self.kinds.len() {
                break;
            }
            chain.push(code);
            parent = self.lookup(code).and_then(|k| k.spec().parent);
        }
        chain
    }

    /// Catalog view of every registered kind.
    pub fn entries(&self) -> Vec<KindEntry> {
        self.kinds
            .iter()
            .map(|k| {
                let spec = k.spec();
                KindEntry {
                    name: spec.name,
                    code: spec.code,
                    status: spec.status,
                    message: spec.message,
                    parent: spec.parent,
                    builtin: k.is_builtin(),
                }
            })
            .collect()
    }

    /// Bind the application error handler for every known kind and attach
    /// `monitor` to the monitored kinds and their sub-kinds.
    ///
    /// Meant to run once while the dispatch table is being built.
    pub fn register_all(&self, table: &mut DispatchTable, monitor: Option<Arc<dyn ErrorMonitor>>) {
        for kind in &self.kinds {
            table.bind(*kind);
        }

        let Some(monitor) = monitor else {
            tracing::info!("No error monitor configured, AI error monitoring disabled");
            return;
        };

        for monitored in MONITORED_KINDS {
            if self.lookup(monitored).is_none() {
                tracing::warn!(code = monitored, "Monitored kind is not registered, skipping");
                continue;
            }
            for kind in &self.kinds {
                if self.ancestry(*kind).contains(&monitored) {
                    table.attach_monitor(kind.code(), Arc::clone(&monitor));
                }
            }
            tracing::debug!(code = monitored, "Error monitoring attached");
        }
    }
}
