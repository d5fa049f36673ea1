//! Shared fixture for the end-to-end tests: a small solution with three
//! projects, one external reference, and a build log.
//!
//! ```text
//! App -> Net -> Base
//! App -> Base            (redundant)
//! App -> third_party/zlib (external, file missing)
//! ```
//!
//! The log times Base (#1) and Net (#2) and reports `Base.lib` as unused by
//! Net.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}") = "App", "src\App\App.vcxproj", "{00000000-0000-0000-0000-000000000001}"
EndProject
Project("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}") = "Net", "src\Net\Net.vcxproj", "{00000000-0000-0000-0000-000000000002}"
EndProject
Project("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}") = "Base", "src\Base\Base.vcxproj", "{00000000-0000-0000-0000-000000000003}"
EndProject
Global
EndGlobal
"#;

const APP: &str = r#"<Project>
  <ItemGroup>
    <ProjectReference Include="..\Net\Net.vcxproj" />
    <ProjectReference Include="..\Base\Base.vcxproj" />
    <ProjectReference Include="$(SolutionDir)third_party\zlib\zlib.vcxproj" />
  </ItemGroup>
</Project>
"#;

const NET: &str = r#"<Project>
  <ItemDefinitionGroup>
    <Link><OutputFile>$(OutDir)$(TargetName).lib</OutputFile></Link>
  </ItemDefinitionGroup>
  <ItemGroup>
    <ProjectReference Include="..\Base\Base.vcxproj" />
  </ItemGroup>
</Project>
"#;

const BASE: &str = r"<Project>
  <ItemDefinitionGroup>
    <Lib><OutputFile>$(OutDir)Base.lib</OutputFile></Lib>
  </ItemDefinitionGroup>
</Project>
";

pub const BUILD_LOG: &str = "\
1>------ Build started: Project: Base, Configuration: Release x64 ------
1>Project Performance Summary:
1>     1650 ms  C:\\src\\Base\\Base.vcxproj              1 calls
1>
1>Target Performance Summary:
1>     1200 ms  ClCompile                                  1 calls
1>      300 ms  Link                                       1 calls
1>
2>------ Build started: Project: Net, Configuration: Release x64 ------
2>Unused libraries:
2>  C:\\out\\Base.lib
2>
2>Project Performance Summary:
2>    61000 ms  C:\\src\\Net\\Net.vcxproj                1 calls
2>
2>Target Performance Summary:
2>    58000 ms  ClCompile                                  1 calls
2>     2500 ms  Link                                       1 calls
2>
";

/// A temporary workspace holding the fixture.
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(&root.join("All.sln"), SOLUTION);
        write(&root.join("src/App/App.vcxproj"), APP);
        write(&root.join("src/Net/Net.vcxproj"), NET);
        write(&root.join("src/Base/Base.vcxproj"), BASE);
        write(&root.join("build.log"), BUILD_LOG);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn solution(&self) -> PathBuf {
        self.path().join("All.sln")
    }

    pub fn log(&self) -> PathBuf {
        self.path().join("build.log")
    }

    /// `refgraph` running inside the fixture with isolated config and logs.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("refgraph"));
        cmd.current_dir(self.path());
        cmd.env("REFGRAPH_LOG", "error");
        cmd.env("XDG_CONFIG_HOME", self.path().join(".config"));
        cmd.env("HOME", self.path());
        cmd.env_remove("FORMAT");
        cmd
    }

    /// Run with `--format json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(args)
            .args(["--format", "json"])
            .output()
            .expect("refgraph should not crash");
        assert!(
            output.status.success(),
            "refgraph {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("valid JSON")
    }
}

fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, text).expect("write fixture");
}
