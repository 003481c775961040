//! Shared test utilities for integration and E2E tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("nuget.config", configs::NUGET_ORG);
//!     fixture.command().arg("sources").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common NuGet and MSBuild documents for testing.
#[allow(dead_code)]
pub mod configs {
    /// A config declaring nuget.org.
    pub const NUGET_ORG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <packageSources>
    <add key="nuget.org" value="https://api.nuget.org/v3/index.json" protocolVersion="3" />
  </packageSources>
</configuration>
"#;

    /// A config that clears inherited sources and declares a private feed.
    pub const CLEAR_AND_PRIVATE: &str = r#"<configuration>
  <packageSources>
    <clear />
    <add key="private" value="https://pkgs.example.com/nuget/v3/index.json" />
  </packageSources>
  <packageSourceCredentials>
    <private>
      <add key="Username" value="ci-bot" />
      <add key="ClearTextPassword" value="s3cret" />
    </private>
  </packageSourceCredentials>
</configuration>
"#;

    /// A config with a DTD, which must be ignored entirely.
    pub const WITH_DOCTYPE: &str = r#"<?xml version="1.0"?>
<!DOCTYPE configuration [ <!ENTITY feed "https://evil.example.com/v3/index.json"> ]>
<configuration>
  <packageSources>
    <add key="evil" value="&feed;" />
  </packageSources>
</configuration>
"#;

    /// A central props file with both declaration encodings.
    pub const PROPS: &str = r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
  </PropertyGroup>
  <ItemGroup>
    <PackageVersion Include="Serilog" Version="3.1.1" />
    <PackageVersion Include="Polly">
      <Version>8.2.0</Version>
    </PackageVersion>
  </ItemGroup>
</Project>
"#;

    /// An SDK-style project resolving against [`PROPS`].
    pub const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Serilog" />
    <PackageReference Include="Polly" VersionOverride="7.2.4" />
    <PackageReference Include="Dapper" Version="2.1.28" />
  </ItemGroup>
</Project>
"#;

    /// A legacy, packages.config-based project.
    pub const LEGACY_PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Library</OutputType>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="Newtonsoft.Json, Version=13.0.0.0">
      <HintPath>..\packages\Newtonsoft.Json.13.0.3\lib\net45\Newtonsoft.Json.dll</HintPath>
    </Reference>
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
  <Import Project="$(SolutionDir)\.nuget\NuGet.targets" Condition="Exists('$(SolutionDir)\.nuget\NuGet.targets')" />
</Project>
"#;

    /// The package list matching [`LEGACY_PROJECT`].
    pub const PACKAGES_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="13.0.3" targetFramework="net472" />
  <package id="StyleCop.Analyzers" version="1.1.118" targetFramework="net472" developmentDependency="true" />
</packages>
"#;
}

/// A temporary directory populated with test files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content, creating parent dirs.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add a legacy project `<dir>/<name>.csproj` with its `packages.config`.
    #[allow(dead_code)]
    pub fn with_legacy_project(self, dir: &str, name: &str) -> Self {
        self.with_file(&format!("{dir}/{name}.csproj"), configs::LEGACY_PROJECT)
            .with_file(&format!("{dir}/packages.config"), configs::PACKAGES_CONFIG)
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file inside the fixture.
    #[allow(dead_code)]
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Read a fixture file back as a string.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.join(path)).expect("Failed to read fixture file")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory with the user-level
    /// config pointed into the fixture, so the developer's own NuGet config
    /// never leaks into a test.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nuget-resolve");
        cmd.current_dir(self.path())
            .env("NUGET_RESOLVE_USER_CONFIG", self.join(".user/NuGet.Config"))
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_nested_file() {
        let fixture = TestFixture::new().with_file("a/b/nuget.config", configs::NUGET_ORG);
        assert!(fixture.join("a/b/nuget.config").exists());
    }

    #[test]
    fn test_fixture_with_legacy_project() {
        let fixture = TestFixture::new().with_legacy_project("App", "App");
        assert!(fixture.join("App/App.csproj").exists());
        assert!(fixture.join("App/packages.config").exists());
    }
}
