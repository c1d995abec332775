use iis_vdir::domain::ResourceDescriptor;
use iis_vdir::framework::mock::MockRunner;
use iis_vdir::framework::{Action, ChannelError};
use iis_vdir::lifecycle::{parse_manifest, ProviderConfig};
use iis_vdir::vdir_provider::{self, VirtualDirectoryError};
use std::sync::Arc;

const SITE1_ASSETS: &str = r#"[{"name":"Site1/assets","physicalpath":"C:\\web\\assets","user_name":null,"password":null,"application":null,"sitename":"Site1"}]"#;

fn assets() -> ResourceDescriptor {
    ResourceDescriptor::new("assets")
        .with_site("Site1")
        .with_physical_path("C:\\web\\assets")
}

/// A whole batch is reconciled against a single discovery call.
#[tokio::test]
async fn test_batch_discovers_once() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout(SITE1_ASSETS);
    mock.expect_script_containing("New-WebVirtualDirectory -Name 'media'")
        .return_stdout("");
    mock.expect_script_containing("New-WebVirtualDirectory -Name 'docs'")
        .return_stdout("");

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let desired = vec![
        assets(),
        ResourceDescriptor::new("media")
            .with_site("Site1")
            .with_physical_path("C:\\web\\media"),
        ResourceDescriptor::new("docs")
            .with_site("Site1")
            .with_physical_path("C:\\web\\docs"),
    ];
    let report = reconciler.reconcile(&desired).await;

    assert!(report.is_success());
    assert_eq!(report.discovered, 1);
    assert_eq!(report.outcome("assets").unwrap().action, Action::NoOp);
    assert_eq!(report.outcome("media").unwrap().action, Action::Create);
    assert_eq!(report.outcome("docs").unwrap().action, Action::Create);

    let discoveries = mock
        .rendered_calls()
        .iter()
        .filter(|script| script.contains("Get-Website"))
        .count();
    assert_eq!(discoveries, 1);
    mock.verify();
}

/// A rejected resource does not stop the rest of the batch.
#[tokio::test]
async fn test_failure_does_not_abort_batch() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout("");
    mock.expect_script_containing("New-WebVirtualDirectory -Name 'locked'")
        .return_failure(1, "Access is denied.\r\n");
    mock.expect_script_containing("New-WebVirtualDirectory -Name 'open'")
        .return_stdout("");

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let desired = vec![
        ResourceDescriptor::new("nowhere").with_site("Site1"),
        ResourceDescriptor::new("locked")
            .with_site("Site1")
            .with_physical_path("C:\\locked"),
        ResourceDescriptor::new("open")
            .with_site("Site1")
            .with_physical_path("C:\\open"),
    ];
    let report = reconciler.reconcile(&desired).await;

    assert!(!report.is_success());
    assert_eq!(report.failures().count(), 2);

    let missing = report.outcome("nowhere").unwrap().result.clone().unwrap_err();
    assert_eq!(
        missing,
        VirtualDirectoryError::MissingField {
            name: "nowhere".into(),
            field: "physicalpath",
        }
    );

    let denied = report.outcome("locked").unwrap().result.clone().unwrap_err();
    assert_eq!(
        denied,
        VirtualDirectoryError::CommandFailed {
            name: "locked".into(),
            operation: Action::Create,
            message: "Access is denied.".into(),
        }
    );
    assert_eq!(
        denied.to_string(),
        "Failed to create virtual directory 'locked': Access is denied."
    );

    assert!(report.outcome("open").unwrap().is_success());
    // "nowhere" was refused before anything was sent.
    assert_eq!(mock.call_count(), 3);
    mock.verify();
}

/// Unreadable discovery output reads as an empty host.
#[tokio::test]
async fn test_unreadable_discovery_creates() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website")
        .return_failure(1, "Import-Module : The specified module 'WebAdministration' was not loaded");
    mock.expect_script_containing("New-WebVirtualDirectory").return_stdout("");

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let report = reconciler.reconcile(&[assets()]).await;

    assert!(report.is_success());
    assert_eq!(report.discovered, 0);
    assert_eq!(report.outcome("assets").unwrap().action, Action::Create);
    mock.verify();
}

#[tokio::test]
async fn test_discovery_channel_error_creates() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website")
        .return_err(ChannelError::Launch("powershell.exe: not found".into()));
    mock.expect_script_containing("New-WebVirtualDirectory")
        .return_err(ChannelError::Launch("powershell.exe: not found".into()));

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let report = reconciler.reconcile(&[assets()]).await;

    let error = report.outcome("assets").unwrap().result.clone().unwrap_err();
    assert!(matches!(error, VirtualDirectoryError::Channel { .. }));
    assert_eq!(error.resource_name(), "assets");
    mock.verify();
}

/// Create, then a second pass that finds it: nothing further is sent.
#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout("[]");
    mock.expect_script_containing("New-WebVirtualDirectory").return_stdout("");
    mock.expect_script_containing("Get-Website").return_stdout(SITE1_ASSETS);

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let first = reconciler.reconcile(&[assets()]).await;
    assert_eq!(first.outcome("assets").unwrap().action, Action::Create);

    let second = reconciler.reconcile(&[assets()]).await;
    assert_eq!(second.outcome("assets").unwrap().action, Action::NoOp);
    assert!(second.is_success());

    assert_eq!(mock.call_count(), 3);
    mock.verify();
}

/// An application spelled with slashes is the application discovery reports without them.
#[tokio::test]
async fn test_slashed_application_is_idempotent() {
    let discovered = r#"[{"name":"Site1/App1/sub","physicalpath":"C:\\web\\sub","application":"App1","sitename":"Site1"}]"#;

    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout("[]");
    mock.expect_script_containing("New-WebVirtualDirectory -Name 'sub'").return_stdout("");
    mock.expect_script_containing("Get-Website").return_stdout(discovered);

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let desired = [ResourceDescriptor::new("sub")
        .with_site("Site1")
        .with_application("/App1")
        .with_physical_path("C:\\web\\sub")];

    let first = reconciler.reconcile(&desired).await;
    assert_eq!(first.outcome("sub").unwrap().action, Action::Create);

    let second = reconciler.reconcile(&desired).await;
    assert_eq!(second.outcome("sub").unwrap().action, Action::NoOp);
    assert!(second.is_success());

    assert_eq!(mock.call_count(), 3);
    mock.verify();
}

/// Spellings that differ in case or in how much of the path they repeat are one directory.
#[tokio::test]
async fn test_pass_matches_any_spelling() {
    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout(SITE1_ASSETS);

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let mut pass = reconciler.begin_pass().await;

    assert_eq!(pass.records().len(), 1);
    assert!(pass.present(&ResourceDescriptor::new("SITE1/ASSETS")));
    assert!(pass.present(&ResourceDescriptor::new("Site1\\assets")));
    assert!(pass.present(&ResourceDescriptor::new("Assets").with_site("site1")));
    assert!(!pass.present(&ResourceDescriptor::new("assets").with_site("Site2")));
    assert!(!pass.present(&ResourceDescriptor::new("assets")));

    let found = pass
        .find(&ResourceDescriptor::new("assets").with_site("Site1"))
        .unwrap();
    assert_eq!(found.physical_path(), Some("C:\\web\\assets"));

    assert_eq!(mock.call_count(), 1);
    mock.verify();
}

#[tokio::test]
async fn test_manifest_drives_a_pass() {
    let manifest = r#"[
        {"name": "assets", "sitename": "Site1", "physicalpath": "C:\\web\\assets"},
        {"name": "old", "sitename": "Site1", "ensure": "absent"}
    ]"#;
    let desired = parse_manifest(manifest, "inline").unwrap();

    let mock = Arc::new(MockRunner::new());
    mock.expect_script_containing("Get-Website").return_stdout(SITE1_ASSETS);

    let reconciler = vdir_provider::new(mock.clone(), ProviderConfig::default());
    let report = reconciler.reconcile(&desired).await;

    assert!(report.is_success());
    assert_eq!(report.outcome("assets").unwrap().action, Action::NoOp);
    assert_eq!(report.outcome("old").unwrap().action, Action::NoOp);
    mock.verify();
}
