//! Shared helpers for integration tests

#![allow(dead_code)]

use codeforge::archive;
use codeforge::process::MockProcessRunner;
use codeforge::{BuildOrchestrator, ToolchainSelector, ToolchainSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `files` into a fresh directory.
pub fn project_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().expect("No parent")).expect("Failed to create dirs");
        fs::write(&path, contents).expect("Failed to write project file");
    }
    dir
}

pub fn project_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let dir = project_dir(files);
    archive::pack_directory(dir.path()).expect("Failed to pack project")
}

pub fn csharp_project() -> Vec<u8> {
    project_zip(&[
        (
            "HelloApp.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <OutputType>Exe</OutputType>\n  </PropertyGroup>\n</Project>\n",
        ),
        (
            "Program.cs",
            "System.Console.WriteLine(\"Hello\");\n",
        ),
    ])
}

pub fn cpp_project() -> Vec<u8> {
    project_zip(&[
        (
            "CMakeLists.txt",
            "cmake_minimum_required(VERSION 3.10)\nproject(hello)\nadd_executable(hello main.cpp)\n",
        ),
        ("main.cpp", "int main() { return 0; }\n"),
    ])
}

pub fn sketch_project() -> Vec<u8> {
    project_zip(&[(
        "blink/sketch.ino",
        "void setup() { pinMode(13, OUTPUT); }\nvoid loop() {}\n",
    )])
}

pub struct Harness {
    pub root: TempDir,
    pub runner: Arc<MockProcessRunner>,
    pub orchestrator: BuildOrchestrator,
}

impl Harness {
    pub fn new(runner: MockProcessRunner) -> Self {
        Self::with_settings(runner, ToolchainSettings::default())
    }

    pub fn with_settings(runner: MockProcessRunner, settings: ToolchainSettings) -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let runner = Arc::new(runner);
        let selector = ToolchainSelector::new(settings, runner.clone());
        let orchestrator = BuildOrchestrator::with_root(root.path().join("tmp_projects"), selector)
            .expect("Failed to create orchestrator");
        Self {
            root,
            runner,
            orchestrator,
        }
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.orchestrator.workspace_root().to_path_buf()
    }

    pub fn leftover_workspaces(&self) -> Vec<PathBuf> {
        list_dir(&self.workspace_root())
    }
}

pub fn list_dir(path: &Path) -> Vec<PathBuf> {
    fs::read_dir(path)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}
