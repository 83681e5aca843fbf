//! DirLocator behavior: discovery, platform filtering, partial failure.

use std::fs;
use std::path::PathBuf;

use loupe::{BuildConfig, DirLocator, Error, Loader, Locator};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// One tree shared by every test in this file; read-only after setup. The
/// module lives under `proj/`, the dependency cache beside it under
/// `deps/`.
static TREE: Lazy<TempDir> = Lazy::new(|| {
    let dir = TempDir::new().expect("tempdir");
    let files: &[(&str, &str)] = &[
        (
            "proj/go.mod",
            "module example.com/proj\n\nrequire example.com/lib v1.4.0\n",
        ),
        ("proj/root.go", "package proj\n\ntype Root struct{}\n"),
        ("proj/api/api.go", "package api\n\ntype API struct{}\n"),
        ("proj/api/api_test.go", "package api\n"),
        ("proj/api/v2/v2.go", "package v2\n\ntype API struct{}\n"),
        (
            "proj/internal/os/os_linux.go",
            "package os\n\ntype Linux struct{}\n",
        ),
        (
            "proj/internal/os/os_windows.go",
            "package os\n\ntype Windows struct{}\n",
        ),
        ("proj/docs/readme.txt", "not a package\n"),
        ("proj/testdata/skip.go", "package skip\n"),
        ("proj/_attic/old.go", "package old\n"),
        ("deps/example.com/lib/go.mod", "module example.com/lib\n"),
        ("deps/example.com/lib/lib.go", "package lib\n\ntype Lib struct{}\n"),
    ];
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write fixture");
    }
    dir
});

fn proj_root() -> PathBuf {
    TREE.path().join("proj")
}

fn dep_root() -> PathBuf {
    TREE.path().join("deps")
}

fn config() -> BuildConfig {
    BuildConfig::new("linux", "amd64")
}

#[test]
fn test_wildcard_discovers_every_package_dir() {
    let locator = DirLocator::new(proj_root());
    let metas = locator.locate("./...", &config()).expect("walk");

    let mut found: Vec<&str> = metas.iter().map(|m| m.import_path.as_ref()).collect();
    found.sort();
    assert_eq!(
        found,
        [
            "example.com/proj",
            "example.com/proj/api",
            "example.com/proj/api/v2",
            "example.com/proj/internal/os",
        ]
    );

    // Cross-check against an independent sweep of the fixture: every
    // buildable file under the module is accounted for, and nothing from
    // testdata/ or _attic/ leaks in.
    let mut swept = 0;
    for entry in walkdir::WalkDir::new(proj_root()) {
        let entry = entry.expect("walk fixture");
        let path = entry.path();
        let skipped = path.components().any(|c| {
            let part = c.as_os_str().to_string_lossy();
            part == "testdata" || part.starts_with('_')
        });
        if !skipped
            && entry.file_type().is_file()
            && path.extension().is_some_and(|e| e == "go")
            && !path.to_string_lossy().ends_with("_test.go")
        {
            swept += 1;
        }
    }
    let listed: usize = metas.iter().map(|m| m.go_files.len()).sum();
    assert_eq!(listed, swept - 1, "one of the swept files is windows-only");
}

#[test]
fn test_platform_filtering_is_config_driven() {
    let locator = DirLocator::new(proj_root());

    let linux = locator
        .locate("example.com/proj/internal/os", &config())
        .expect("linux");
    assert_eq!(linux[0].go_files, ["os_linux.go"]);

    let windows = locator
        .locate(
            "example.com/proj/internal/os",
            &BuildConfig::new("windows", "amd64"),
        )
        .expect("windows");
    assert_eq!(windows[0].go_files, ["os_windows.go"]);
}

#[test]
fn test_test_files_are_classified_separately() {
    let locator = DirLocator::new(proj_root());
    let metas = locator.locate("./api", &config()).expect("api");

    assert_eq!(metas[0].go_files, ["api.go"]);
    assert_eq!(metas[0].test_go_files, ["api_test.go"]);
    assert!(metas[0].x_test_go_files.is_empty());
}

#[test]
fn test_meta_carries_module_and_deps() {
    let locator = DirLocator::new(proj_root());
    let metas = locator.locate("./api", &config()).expect("api");

    let module = metas[0].module.as_ref().expect("module");
    assert_eq!(module.path.as_ref(), "example.com/proj");
    assert_eq!(module.dir, proj_root().canonicalize().expect("canon"));
    assert_eq!(
        metas[0].deps.iter().map(|d| d.as_ref()).collect::<Vec<_>>(),
        ["example.com/lib"]
    );
}

#[test]
fn test_dep_dir_resolution_and_module_ref() {
    let locator = DirLocator::new(proj_root()).with_dep_dir(dep_root());
    let metas = locator.locate("example.com/lib", &config()).expect("lib");

    assert_eq!(metas[0].import_path.as_ref(), "example.com/lib");
    assert_eq!(metas[0].go_files, ["lib.go"]);
    let module = metas[0].module.as_ref().expect("module");
    assert_eq!(module.path.as_ref(), "example.com/lib");
}

#[test]
fn test_directory_without_go_files_reports_partial_failure() {
    let locator = DirLocator::new(proj_root());
    let metas = locator.locate("./docs", &config()).expect("docs locates");

    assert_eq!(metas.len(), 1);
    let message = metas[0].error.as_ref().expect("error entry");
    assert!(message.contains("no Go files"), "got: {message}");

    // The loader surfaces that entry as an error without failing siblings.
    let loader = Loader::for_root(proj_root(), config());
    let result = loader.load(["./docs", "./api"]);
    assert_eq!(result.packages.len(), 1);
    assert_eq!(result.packages[0].import_path(), "example.com/proj/api");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(&result.errors[0], Error::Locate { .. }));
}

#[test]
fn test_missing_directory_is_not_found() {
    let locator = DirLocator::new(proj_root());
    let err = locator.locate("./nope", &config()).expect_err("missing");
    assert!(err.is_not_found());
}

#[test]
fn test_module_path_prefix_resolves_inside_root() {
    let locator = DirLocator::new(proj_root());
    assert_eq!(locator.module_path(), "example.com/proj");

    let metas = locator
        .locate("example.com/proj/api/v2", &config())
        .expect("v2");
    assert_eq!(metas[0].import_path.as_ref(), "example.com/proj/api/v2");
    assert_eq!(metas[0].name, "v2");
}
