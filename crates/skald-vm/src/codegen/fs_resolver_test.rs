// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the filesystem import resolver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::FsResolver;
use crate::codegen::ImportResolver;
use std::fs;
use std::io::Read;

#[test]
fn resolves_relative_to_the_entry_file() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("main.sk");
    let lib = dir.path().join("lib.sk");
    fs::write(&entry, "import \"lib.sk\"\n").unwrap();
    fs::write(&lib, "42\n").unwrap();

    let mut resolver = FsResolver::new(entry.to_str().unwrap());
    let canonical = resolver.normalize("lib.sk").unwrap();
    let mut reader = resolver.open(&canonical).unwrap();

    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content, "42\n");
    resolver.close();
}

#[test]
fn nested_imports_resolve_against_their_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();

    fs::write(dir.path().join("main.sk"), "").unwrap();
    fs::write(sub.join("outer.sk"), "outer").unwrap();
    fs::write(sub.join("inner.sk"), "inner").unwrap();

    let entry = dir.path().join("main.sk");
    let mut resolver = FsResolver::new(entry.to_str().unwrap());

    // Enter sub/outer.sk; "inner.sk" must now resolve inside sub/.
    let outer = resolver.normalize("sub/outer.sk").unwrap();
    let _outer_reader = resolver.open(&outer).unwrap();

    let inner = resolver.normalize("inner.sk").unwrap();
    assert!(inner.ends_with("inner.sk"));
    let mut reader = resolver.open(&inner).unwrap();
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content, "inner");

    // Leaving both restores resolution to the entry directory.
    resolver.close();
    resolver.close();
    assert!(resolver.normalize("inner.sk").is_err());
    assert!(resolver.normalize("sub/outer.sk").is_ok());
}

#[test]
fn missing_files_fail_to_normalize() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("main.sk");
    fs::write(&entry, "").unwrap();

    let mut resolver = FsResolver::new(entry.to_str().unwrap());
    assert!(resolver.normalize("nope.sk").is_err());
}
