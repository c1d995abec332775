use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a virtual directory should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// Desired state of one IIS virtual directory, as declared by the caller.
///
/// `name` may be a bare directory name (`"assets"`) or a hierarchical path that
/// already carries the site and/or application (`"Default Web Site/app/assets"`,
/// either separator). See [`crate::vdir_provider::path`] for how it is normalized.
///
/// Empty strings in optional fields are treated as unset.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physicalpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub ensure: Ensure,
}

impl ResourceDescriptor {
    /// Creates a descriptor for a directory that should be present.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.sitename = Some(site.into());
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_physical_path(mut self, path: impl Into<String>) -> Self {
        self.physicalpath = Some(path.into());
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_credentials(self, user_name: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_user_name(user_name).with_password(password)
    }

    /// Marks the directory for removal.
    pub fn absent(mut self) -> Self {
        self.ensure = Ensure::Absent;
        self
    }

    pub fn site(&self) -> Option<&str> {
        non_empty(&self.sitename)
    }

    pub fn application(&self) -> Option<&str> {
        non_empty(&self.application)
    }

    pub fn physical_path(&self) -> Option<&str> {
        non_empty(&self.physicalpath)
    }

    pub fn user_name(&self) -> Option<&str> {
        non_empty(&self.user_name)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("sitename", &self.sitename)
            .field("application", &self.application)
            .field("physicalpath", &self.physicalpath)
            .field("user_name", &self.user_name)
            .field("password", &redacted(&self.password))
            .field("ensure", &self.ensure)
            .finish()
    }
}

/// A virtual directory as reported by discovery.
///
/// Records are rebuilt on every pass and never modified afterwards. The password
/// is read for drift detection but never written back out.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VirtualDirectory {
    pub name: String,
    #[serde(default)]
    pub physicalpath: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub sitename: Option<String>,
}

impl VirtualDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Discovered records always describe a live directory.
    pub fn ensure(&self) -> Ensure {
        Ensure::Present
    }

    pub fn site(&self) -> Option<&str> {
        non_empty(&self.sitename)
    }

    pub fn application(&self) -> Option<&str> {
        non_empty(&self.application)
    }

    pub fn physical_path(&self) -> Option<&str> {
        non_empty(&self.physicalpath)
    }

    pub fn user_name(&self) -> Option<&str> {
        non_empty(&self.user_name)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }
}

impl fmt::Debug for VirtualDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualDirectory")
            .field("name", &self.name)
            .field("sitename", &self.sitename)
            .field("application", &self.application)
            .field("physicalpath", &self.physicalpath)
            .field("user_name", &self.user_name)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}
