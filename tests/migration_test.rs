//! Integration tests for packages.config migration.

#[allow(dead_code)]
mod common;
use common::prelude::*;

use nuget_resolve::error::Error;
use nuget_resolve::migrate::{migrate_all_in_folder, migrate_project, CancellationToken};
use nuget_resolve::version_source::{resolve_project_packages, VersionSource};

#[test]
fn test_migrated_project_resolves_inline_versions() {
    let fixture = TestFixture::new().with_legacy_project("App", "App");
    let project = fixture.join("App/App.csproj");

    let result = migrate_project(&project);
    assert!(result.success(), "{:?}", result.error());
    assert_eq!(result.packages_migrated(), 2);

    assert!(!fixture.join("App/packages.config").exists());
    assert_eq!(fixture.read("App/App.csproj.bak"), configs::LEGACY_PROJECT);

    let packages = resolve_project_packages(&project).unwrap();
    assert_eq!(packages.len(), 2);
    assert!(packages.iter().all(|p| p.source == VersionSource::Inline));
    assert_eq!(packages[0].id, "Newtonsoft.Json");
    assert_eq!(packages[0].version.as_deref(), Some("13.0.3"));

    let text = fixture.read("App/App.csproj");
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(!text.contains("HintPath"));
    assert!(!text.contains("NuGet.targets"));
    assert!(text.contains("Microsoft.CSharp.targets"));
}

#[test]
fn test_crlf_line_endings_survive_migration() {
    let fixture = TestFixture::new()
        .with_file("App/App.csproj", &configs::LEGACY_PROJECT.replace('\n', "\r\n"))
        .with_file("App/packages.config", configs::PACKAGES_CONFIG);

    let result = migrate_project(&fixture.join("App/App.csproj"));
    assert!(result.success(), "{:?}", result.error());

    let text = fixture.read("App/App.csproj");
    assert!(text.contains("\r\n"));
    assert!(!text.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_failed_migration_leaves_project_byte_identical() {
    let fixture = TestFixture::new()
        .with_file("App/App.csproj", configs::LEGACY_PROJECT)
        .with_file("App/packages.config", "<packages><package id=");

    let result = migrate_project(&fixture.join("App/App.csproj"));

    assert!(!result.success());
    assert_eq!(fixture.read("App/App.csproj"), configs::LEGACY_PROJECT);
    assert!(fixture.join("App/packages.config").exists());
}

#[test]
fn test_batch_reports_every_project() {
    let fixture = TestFixture::new()
        .with_legacy_project("src/Api", "Api")
        .with_legacy_project("src/Core", "Core")
        .with_file("src/Orphan/packages.config", configs::PACKAGES_CONFIG)
        .with_legacy_project("src/Api/bin/Debug", "Stale");

    let messages = std::cell::RefCell::new(Vec::new());
    let report: &dyn Fn(&str) = &|message: &str| messages.borrow_mut().push(message.to_string());
    let results =
        migrate_all_in_folder(fixture.path(), &CancellationToken::new(), Some(report)).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.success()).count(), 2);
    let orphan = results.iter().find(|r| !r.success()).unwrap();
    assert!(orphan.error().unwrap().contains("No project file"));
    assert_eq!(messages.borrow().len(), 3);

    // bin/ is never searched
    assert!(fixture.join("src/Api/bin/Debug/packages.config").exists());
}

#[test]
fn test_cancelled_batch_touches_nothing() {
    let fixture = TestFixture::new().with_legacy_project("App", "App");
    let token = CancellationToken::new();
    token.cancel();

    let result = migrate_all_in_folder(fixture.path(), &token, None);

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(fixture.read("App/App.csproj"), configs::LEGACY_PROJECT);
    assert!(!fixture.join("App/App.csproj.bak").exists());
}

#[cfg(unix)]
#[test]
fn test_migration_keeps_project_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new().with_legacy_project("App", "App");
    let project = fixture.join("App/App.csproj");
    std::fs::set_permissions(&project, std::fs::Permissions::from_mode(0o644)).unwrap();

    let result = migrate_project(&project);
    assert!(result.success(), "{:?}", result.error());

    let mode = std::fs::metadata(&project).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
