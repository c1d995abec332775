//! Command synthesis for create, update and destroy.
//!
//! Commands are built as a list of [`Statement`] values. Each statement quotes
//! its own arguments when rendered, and the list is joined into one script
//! only at dispatch. Validation happens before any statement exists, so a
//! rejected descriptor never produces a partial command.

use crate::domain::ResourceDescriptor;
use crate::vdir_provider::error::VirtualDirectoryError;
use crate::vdir_provider::path::CanonicalPath;
use std::fmt;

/// Where a physical path lives, which decides how a directory is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A drive-letter path such as `C:\inetpub\assets`.
    Local,
    /// Anything else, in practice a UNC share such as `\\files\assets`.
    NetworkShare,
}

impl PathKind {
    pub fn of(path: &str) -> Self {
        let mut chars = path.chars();
        let drive = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.next() == Some(':')
            && matches!(chars.next(), Some('/' | '\\'));
        if drive {
            PathKind::Local
        } else {
            PathKind::NetworkShare
        }
    }
}

/// A settable property of a virtual directory on the `IIS:` drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    PhysicalPath,
    Application,
    UserName,
    Password,
}

impl Property {
    pub fn key(&self) -> &'static str {
        match self {
            Property::PhysicalPath => "physicalPath",
            Property::Application => "application",
            Property::UserName => "userName",
            Property::Password => "password",
        }
    }
}

/// One WebAdministration statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Site-bound creation, used for local physical paths.
    NewWebVirtualDirectory {
        name: String,
        site: String,
        application: Option<String>,
        physical_path: String,
    },
    /// Creation of the item at its canonical path, used for network shares.
    ///
    /// Site-bound creation fails when a share is briefly unreachable; creating
    /// the item directly does not touch the share.
    NewItem {
        path: CanonicalPath,
        physical_path: String,
    },
    SetProperty {
        path: CanonicalPath,
        property: Property,
        value: String,
    },
    TestPath {
        path: CanonicalPath,
    },
    RemoveItem {
        path: CanonicalPath,
    },
}

impl Statement {
    fn set(path: &CanonicalPath, property: Property, value: &str) -> Self {
        Statement::SetProperty {
            path: path.clone(),
            property,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::NewWebVirtualDirectory {
                name,
                site,
                application,
                physical_path,
            } => {
                write!(f, "New-WebVirtualDirectory -Name {} -Site {}", quote(name), quote(site))?;
                if let Some(application) = application {
                    write!(f, " -Application {}", quote(application))?;
                }
                write!(f, " -PhysicalPath {} -ErrorAction Stop", quote(physical_path))
            }
            Statement::NewItem { path, physical_path } => write!(
                f,
                "New-Item -Type VirtualDirectory {} -PhysicalPath {} -ErrorAction Stop",
                quote(&path.drive_path()),
                quote(physical_path)
            ),
            Statement::SetProperty { path, property, value } => write!(
                f,
                "Set-ItemProperty -Path {} -Name {} -Value {} -ErrorAction Stop",
                quote(&path.drive_path()),
                quote(property.key()),
                quote(value)
            ),
            Statement::TestPath { path } => {
                write!(f, "Test-Path -Path {}", quote(&path.drive_path()))
            }
            Statement::RemoveItem { path } => write!(
                f,
                "Remove-Item -Path {} -Recurse -ErrorAction Stop",
                quote(&path.drive_path())
            ),
        }
    }
}

/// Renders `value` as a single-quoted PowerShell literal.
///
/// Inside single quotes only `'` is special; it is doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn missing(desired: &ResourceDescriptor, field: &'static str) -> VirtualDirectoryError {
    VirtualDirectoryError::MissingField {
        name: desired.name.clone(),
        field,
    }
}

fn require_leaf(desired: &ResourceDescriptor, path: &CanonicalPath) -> Result<(), VirtualDirectoryError> {
    if path.has_leaf() {
        return Ok(());
    }
    Err(VirtualDirectoryError::InvalidName {
        name: desired.name.clone(),
        reason: format!("'{path}' does not name a directory below a site"),
    })
}

/// Statements that create `desired` at `path`.
///
/// Fails before producing anything when the physical path is unset, when a
/// local path has no site to bind to, or when only half a credential pair is given.
pub fn create_statements(
    desired: &ResourceDescriptor,
    path: &CanonicalPath,
) -> Result<Vec<Statement>, VirtualDirectoryError> {
    let physical_path = desired
        .physical_path()
        .ok_or_else(|| missing(desired, "physicalpath"))?;
    require_leaf(desired, path)?;

    match (desired.user_name(), desired.password()) {
        (Some(_), None) => return Err(missing(desired, "password")),
        (None, Some(_)) => return Err(missing(desired, "user_name")),
        _ => {}
    }

    let mut statements = Vec::with_capacity(3);
    match PathKind::of(physical_path) {
        PathKind::Local => {
            let site = desired.site().ok_or_else(|| missing(desired, "sitename"))?;
            statements.push(Statement::NewWebVirtualDirectory {
                name: path.relative(),
                site: site.to_string(),
                application: desired.application().map(str::to_owned),
                physical_path: physical_path.to_string(),
            });
        }
        PathKind::NetworkShare => statements.push(Statement::NewItem {
            path: path.clone(),
            physical_path: physical_path.to_string(),
        }),
    }

    if let Some(user_name) = desired.user_name() {
        statements.push(Statement::set(path, Property::UserName, user_name));
    }
    if let Some(password) = desired.password() {
        statements.push(Statement::set(path, Property::Password, password));
    }
    Ok(statements)
}

/// One property statement per field set on `desired`; unset fields are left alone.
pub fn update_statements(
    desired: &ResourceDescriptor,
    path: &CanonicalPath,
) -> Result<Vec<Statement>, VirtualDirectoryError> {
    require_leaf(desired, path)?;

    let fields = [
        (Property::PhysicalPath, desired.physical_path()),
        (Property::Application, desired.application()),
        (Property::UserName, desired.user_name()),
        (Property::Password, desired.password()),
    ];
    Ok(fields
        .into_iter()
        .filter_map(|(property, value)| value.map(|v| Statement::set(path, property, v)))
        .collect())
}

/// The live existence check that precedes a removal.
pub fn existence_check(
    desired: &ResourceDescriptor,
    path: &CanonicalPath,
) -> Result<Statement, VirtualDirectoryError> {
    require_leaf(desired, path)?;
    Ok(Statement::TestPath { path: path.clone() })
}

/// Recursive removal of the directory at `path`.
pub fn removal(path: &CanonicalPath) -> Statement {
    Statement::RemoveItem { path: path.clone() }
}

/// Reads the output of an existence check.
pub fn reports_existing(stdout: &str) -> bool {
    stdout.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdir_provider::path::resolve;

    fn path_of(desired: &ResourceDescriptor) -> CanonicalPath {
        resolve(desired.site(), &desired.name, desired.application())
    }

    fn render(statements: &[Statement]) -> Vec<String> {
        statements.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_path_kind() {
        assert_eq!(PathKind::of("C:\\inetpub\\wwwroot"), PathKind::Local);
        assert_eq!(PathKind::of("d:/sites"), PathKind::Local);
        assert_eq!(PathKind::of("\\\\files\\share"), PathKind::NetworkShare);
        assert_eq!(PathKind::of("C:"), PathKind::NetworkShare);
        assert_eq!(PathKind::of("relative\\dir"), PathKind::NetworkShare);
        assert_eq!(PathKind::of("1:\\x"), PathKind::NetworkShare);
        assert_eq!(PathKind::of("?:/x"), PathKind::NetworkShare);
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote("''"), "''''''");
        assert_eq!(quote("plain"), "'plain'");
    }

    #[test]
    fn test_create_local_binds_to_site() {
        let desired = ResourceDescriptor::new("Site1/App1/assets")
            .with_site("Site1")
            .with_application("App1")
            .with_physical_path("C:\\web\\assets");
        let statements = create_statements(&desired, &path_of(&desired)).unwrap();
        assert_eq!(
            render(&statements),
            vec![
                "New-WebVirtualDirectory -Name 'assets' -Site 'Site1' -Application 'App1' \
                 -PhysicalPath 'C:\\web\\assets' -ErrorAction Stop"
            ]
        );
    }

    #[test]
    fn test_create_local_without_site_fails() {
        let desired = ResourceDescriptor::new("Site1/assets").with_physical_path("C:\\web");
        let err = create_statements(&desired, &path_of(&desired)).unwrap_err();
        assert_eq!(
            err,
            VirtualDirectoryError::MissingField {
                name: "Site1/assets".into(),
                field: "sitename"
            }
        );
    }

    #[test]
    fn test_create_without_physical_path_fails_first() {
        let desired = ResourceDescriptor::new("assets");
        let err = create_statements(&desired, &path_of(&desired)).unwrap_err();
        assert!(matches!(
            err,
            VirtualDirectoryError::MissingField { field: "physicalpath", .. }
        ));
    }

    #[test]
    fn test_create_network_share_uses_item_creation() {
        let desired = ResourceDescriptor::new("media")
            .with_site("Site1")
            .with_physical_path("\\\\files\\media")
            .with_credentials("CORP\\svc", "pa'ss");
        let rendered = render(&create_statements(&desired, &path_of(&desired)).unwrap());

        assert!(rendered.iter().all(|s| !s.contains("New-WebVirtualDirectory")));
        assert_eq!(
            rendered,
            vec![
                "New-Item -Type VirtualDirectory 'IIS:\\Sites\\Site1\\media' \
                 -PhysicalPath '\\\\files\\media' -ErrorAction Stop",
                "Set-ItemProperty -Path 'IIS:\\Sites\\Site1\\media' -Name 'userName' \
                 -Value 'CORP\\svc' -ErrorAction Stop",
                "Set-ItemProperty -Path 'IIS:\\Sites\\Site1\\media' -Name 'password' \
                 -Value 'pa''ss' -ErrorAction Stop",
            ]
        );
    }

    #[test]
    fn test_create_network_share_without_site_needs_qualified_name() {
        let qualified = ResourceDescriptor::new("Site1/media").with_physical_path("\\\\files\\media");
        assert!(create_statements(&qualified, &path_of(&qualified)).is_ok());

        let bare = ResourceDescriptor::new("media").with_physical_path("\\\\files\\media");
        assert!(matches!(
            create_statements(&bare, &path_of(&bare)),
            Err(VirtualDirectoryError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_create_rejects_half_a_credential_pair() {
        let desired = ResourceDescriptor::new("x")
            .with_site("Site1")
            .with_physical_path("C:\\x")
            .with_user_name("svc");
        assert!(matches!(
            create_statements(&desired, &path_of(&desired)),
            Err(VirtualDirectoryError::MissingField { field: "password", .. })
        ));
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let desired = ResourceDescriptor::new("assets")
            .with_site("Site1")
            .with_physical_path("D:\\new");
        let statements = update_statements(&desired, &path_of(&desired)).unwrap();
        assert_eq!(
            render(&statements),
            vec![
                "Set-ItemProperty -Path 'IIS:\\Sites\\Site1\\assets' -Name 'physicalPath' \
                 -Value 'D:\\new' -ErrorAction Stop"
            ]
        );
    }

    #[test]
    fn test_update_order_and_escaping() {
        let desired = ResourceDescriptor::new("assets")
            .with_site("Site1")
            .with_application("App1")
            .with_physical_path("D:\\new")
            .with_credentials("svc", "'; Remove-Item C:\\ -Recurse; '");
        let statements = update_statements(&desired, &path_of(&desired)).unwrap();
        let keys: Vec<Property> = statements
            .iter()
            .filter_map(|s| match s {
                Statement::SetProperty { property, .. } => Some(*property),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                Property::PhysicalPath,
                Property::Application,
                Property::UserName,
                Property::Password
            ]
        );
        assert!(statements[3]
            .to_string()
            .ends_with("-Value '''; Remove-Item C:\\ -Recurse; ''' -ErrorAction Stop"));
    }

    #[test]
    fn test_destroy_statements() {
        let desired = ResourceDescriptor::new("Site1/assets").absent();
        let path = path_of(&desired);
        assert_eq!(
            existence_check(&desired, &path).unwrap().to_string(),
            "Test-Path -Path 'IIS:\\Sites\\Site1\\assets'"
        );
        assert_eq!(
            removal(&path).to_string(),
            "Remove-Item -Path 'IIS:\\Sites\\Site1\\assets' -Recurse -ErrorAction Stop"
        );
    }

    #[test]
    fn test_destroy_refuses_to_target_a_site() {
        let desired = ResourceDescriptor::new("Site1").with_site("Site1").absent();
        assert!(existence_check(&desired, &path_of(&desired)).is_err());
    }

    #[test]
    fn test_reports_existing() {
        assert!(reports_existing("True\r\n"));
        assert!(reports_existing(" true "));
        assert!(!reports_existing("False"));
        assert!(!reports_existing(""));
    }
}
