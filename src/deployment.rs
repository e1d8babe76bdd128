//! # Deployment
//!
//! Discovers applications by scanning an application base directory.
//!
//! Every immediate, non-hidden subdirectory of the base becomes one
//! application named after the directory. An optional descriptor at
//! `<dir>/WEB-INF/web.yaml` declares virtual hosts, servlets, mappings and
//! secured URLs:
//!
//! ```yaml
//! vhosts: [shop.example.com]
//! servlets:
//!   - name: files
//!     class: static
//!     init-params:
//!       root: public
//! servlet-mappings:
//!   - url-pattern: /assets/*
//!     servlet-name: files
//! security:
//!   - url-pattern: /admin/*
//!     auth:
//!       realm: Admin
//!       users: { admin: 8c6976e5... }
//! ```
//!
//! Without a descriptor the application gets a single `default` servlet
//! mapped to `/*`.

use crate::application::{Application, ApplicationContext, ServletMapping};
use crate::locator::ServletLocator;
use crate::security::SecuredUrlConfig;
use crate::servlet::ServletRegistry;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Descriptor location relative to the application directory.
pub const DESCRIPTOR_PATH: &str = "WEB-INF/web.yaml";

/// Servlet declaration in `web.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServletDefinition {
    pub name: String,
    /// Servlet class registered in the [`ServletRegistry`]
    pub class: String,
    #[serde(default)]
    pub init_params: BTreeMap<String, String>,
}

/// Parsed `WEB-INF/web.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WebDescriptor {
    pub vhosts: Vec<String>,
    pub servlets: Vec<ServletDefinition>,
    pub servlet_mappings: Vec<ServletMapping>,
    pub security: Vec<SecuredUrlConfig>,
}

impl WebDescriptor {
    /// Descriptor used when an application ships none.
    #[must_use]
    pub fn default_for_application() -> Self {
        Self {
            servlets: vec![ServletDefinition {
                name: "default".to_string(),
                class: "default".to_string(),
                init_params: BTreeMap::new(),
            }],
            servlet_mappings: vec![ServletMapping::new("/*", "default")],
            ..Self::default()
        }
    }

    /// Load `<app_dir>/WEB-INF/web.yaml`, or the default descriptor if absent.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(app_dir: &Path) -> anyhow::Result<Self> {
        let path = app_dir.join(DESCRIPTOR_PATH);
        if !path.is_file() {
            debug!(path = %path.display(), "No deployment descriptor, using defaults");
            return Ok(Self::default_for_application());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Build an application from its directory and descriptor.
///
/// # Errors
///
/// Fails if a servlet names an unknown class.
pub fn build_application(
    name: &str,
    webapp_path: PathBuf,
    descriptor: WebDescriptor,
    context: Arc<ApplicationContext>,
    registry: &ServletRegistry,
) -> anyhow::Result<Application> {
    let mut application = Application::new(name, webapp_path, context);
    for vhost in descriptor.vhosts {
        application = application.with_vhost(vhost);
    }
    for definition in descriptor.servlets {
        let config = application.servlet_config(&definition.name, definition.init_params.clone());
        let Some(servlet) = registry.create(&definition.class, &config) else {
            bail!(
                "Servlet '{}' of application '{}' uses unknown class '{}'",
                definition.name,
                name,
                definition.class
            );
        };
        application.add_servlet(definition.name, servlet, definition.init_params);
    }
    for mapping in descriptor.servlet_mappings {
        application.servlets().add_mapping(mapping);
    }
    for secured in descriptor.security {
        application.servlets().add_secured_url(secured);
    }
    Ok(application)
}

/// Deploy every application below `app_base`.
///
/// Directories are visited in name order; hidden ones (leading `.`) are
/// skipped. Each application is built, given a locator and deployed.
///
/// # Errors
///
/// Fails if `app_base` cannot be listed, or if any application has an
/// invalid descriptor, unknown servlet class, bad URL pattern, or a servlet
/// that fails to initialize.
pub fn deploy_applications(
    app_base: &Path,
    context: &Arc<ApplicationContext>,
    registry: &ServletRegistry,
) -> anyhow::Result<Vec<ServletLocator>> {
    let entries = fs::read_dir(app_base)
        .with_context(|| format!("Failed to read application base {}", app_base.display()))?;

    let mut dirs: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %path.display(), "Skipping directory with non UTF-8 name");
            continue;
        };
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        dirs.push((name, path));
    }
    dirs.sort();

    let mut locators = Vec::with_capacity(dirs.len());
    for (name, path) in dirs {
        let descriptor = WebDescriptor::load(&path)?;
        let application =
            build_application(&name, path, descriptor, Arc::clone(context), registry)?;
        let application = Arc::new(application);
        let locator = ServletLocator::new(Arc::clone(&application))
            .with_context(|| format!("Failed to build routes of application '{name}'"))?;
        application.deploy()?;
        locators.push(locator);
    }

    info!(
        app_base = %app_base.display(),
        applications = locators.len(),
        "Applications deployed"
    );
    Ok(locators)
}
