//! Approximate interface-implementation checks (name + arity matching).

use std::fs;
use std::sync::Arc;

use loupe::{BuildConfig, Loader, Package};
use tempfile::TempDir;

fn fixture(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write fixture");
    }
    dir
}

fn load_one(dir: &TempDir, pattern: &str) -> (Loader, Arc<Package>) {
    let loader = Loader::for_root(dir.path(), BuildConfig::new("linux", "amd64"));
    let mut packages = loader.load([pattern]).into_result().expect("load");
    let package = packages.remove(0);
    (loader, package)
}

const TEXT_CODEC: &str = r#"package enc

type Marshaler interface {
	MarshalText() ([]byte, error)
}

type Unmarshaler interface {
	UnmarshalText(data []byte) error
}

type Doc struct{}

func (d Doc) MarshalText() ([]byte, error) { return nil, nil }

func (d *Doc) UnmarshalText(data []byte) error { return nil }

type Partial struct{}

func (p Partial) MarshalText() ([]byte, error) { return nil, nil }

type Holder struct {
	D  Doc
	DP *Doc
	P  Partial
}
"#;

#[test]
fn test_marshaler_unmarshaler_fixture() {
    let dir = fixture(&[
        ("go.mod", "module example.com/enc\n"),
        ("codec.go", TEXT_CODEC),
    ]);
    let (_loader, package) = load_one(&dir, ".");
    let holder = package.get_struct("Holder").expect("Holder");

    let d = &holder.fields()[0];
    assert!(d.implements(&package, "Marshaler"));
    // The pointer-receiver method answers for the value field too: both
    // method sets are consulted.
    assert!(d.implements(&package, "Unmarshaler"));

    // A pointer field strips one level and reaches the same type.
    let dp = &holder.fields()[1];
    assert!(dp.implements(&package, "Marshaler"));
    assert!(dp.implements(&package, "Unmarshaler"));

    // Missing one method fails only that interface.
    let p = &holder.fields()[2];
    assert!(p.implements(&package, "Marshaler"));
    assert!(!p.implements(&package, "Unmarshaler"));
}

#[test]
fn test_empty_interface_is_vacuously_satisfied() {
    let dir = fixture(&[
        ("go.mod", "module example.com/enc\n"),
        ("codec.go", TEXT_CODEC),
        ("any.go", "package enc\n\ntype Anything interface{}\n"),
    ]);
    let (_loader, package) = load_one(&dir, ".");
    let holder = package.get_struct("Holder").expect("Holder");

    for field in holder.fields() {
        assert!(field.implements(&package, "Anything"), "{}", field.name());
    }
}

#[test]
fn test_arity_must_match_exactly() {
    let dir = fixture(&[
        ("go.mod", "module example.com/enc\n"),
        ("codec.go", TEXT_CODEC),
        (
            "strict.go",
            "package enc\n\ntype WideMarshaler interface {\n\tMarshalText(indent string) ([]byte, error)\n}\n\ntype NarrowMarshaler interface {\n\tMarshalText() []byte\n}\n",
        ),
    ]);
    let (_loader, package) = load_one(&dir, ".");
    let holder = package.get_struct("Holder").expect("Holder");
    let d = &holder.fields()[0];

    // Same name, wrong parameter count.
    assert!(!d.implements(&package, "WideMarshaler"));
    // Same name, wrong result count.
    assert!(!d.implements(&package, "NarrowMarshaler"));
}

#[test]
fn test_embedded_interfaces_expand() {
    let dir = fixture(&[
        ("go.mod", "module example.com/io2\n"),
        (
            "io.go",
            "package io2\n\ntype Reader interface {\n\tRead(p []byte) (int, error)\n}\n\ntype Closer interface {\n\tClose() error\n}\n\ntype ReadCloser interface {\n\tReader\n\tCloser\n}\n",
        ),
        (
            "file.go",
            "package io2\n\ntype File struct{}\n\nfunc (f *File) Read(p []byte) (int, error) { return 0, nil }\n\nfunc (f *File) Close() error { return nil }\n\ntype HalfFile struct{}\n\nfunc (h HalfFile) Read(p []byte) (int, error) { return 0, nil }\n\ntype Holder struct {\n\tF File\n\tH HalfFile\n}\n",
        ),
    ]);
    let (_loader, package) = load_one(&dir, ".");
    let holder = package.get_struct("Holder").expect("Holder");

    assert!(holder.fields()[0].implements(&package, "ReadCloser"));
    assert!(holder.fields()[1].implements(&package, "Reader"));
    assert!(!holder.fields()[1].implements(&package, "ReadCloser"));
}

#[test]
fn test_cross_package_candidate_and_interface() {
    let dir = fixture(&[
        ("go.mod", "module example.com/app\n"),
        (
            "app.go",
            "package app\n\nimport \"example.com/app/store\"\n\ntype App struct {\n\tS store.Store\n}\n",
        ),
        (
            "store/store.go",
            "package store\n\ntype Store struct{}\n\nfunc (s *Store) Get(key string) ([]byte, error) { return nil, nil }\n\nfunc (s *Store) Put(key string, value []byte) error { return nil }\n",
        ),
        (
            "kv/kv.go",
            "package kv\n\ntype Getter interface {\n\tGet(key string) ([]byte, error)\n}\n\ntype Deleter interface {\n\tDelete(key string) error\n}\n",
        ),
    ]);
    let loader = Loader::for_root(dir.path(), BuildConfig::new("linux", "amd64"));
    let packages = loader
        .load([".", "./kv"])
        .into_result()
        .expect("load");
    let app = &packages[0];
    let kv = &packages[1];

    let info = app.get_struct("App").expect("App");
    let field = &info.fields()[0];

    // The field's type lives in a third package; its methods are found
    // there while the interface comes from `kv`.
    assert!(field.implements(kv, "Getter"));
    assert!(!field.implements(kv, "Deleter"));
}

#[test]
fn test_unresolvable_types_degrade_to_false() {
    let dir = fixture(&[
        ("go.mod", "module example.com/app\n"),
        (
            "app.go",
            "package app\n\nimport \"example.com/ghost\"\n\ntype Runner interface {\n\tRun() error\n}\n\ntype App struct {\n\tG ghost.Thing\n\tF func() error\n}\n",
        ),
    ]);
    let (_loader, package) = load_one(&dir, ".");
    let info = package.get_struct("App").expect("App");

    // The defining package cannot be located: not an error, just "no".
    assert!(!info.fields()[0].implements(&package, "Runner"));
    // A func-typed field has no method set at all.
    assert!(!info.fields()[1].implements(&package, "Runner"));
    // Nor does anything implement an absent interface.
    assert!(!info.fields()[0].implements(&package, "Absent"));
}
