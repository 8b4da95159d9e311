extern crate env_logger;
extern crate rescache;
extern crate zip;

use std::fs;
use std::io::{Cursor, Write};

use rescache::prelude::*;

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    writer.add_directory("textures/", options).unwrap();
    for &(name, bytes) in files {
        writer.start_file(name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

#[test]
fn directory() {
    let _ = env_logger::try_init();

    let mut file = DirectoryFile::new("res", "tests/resources");
    file.open().unwrap();

    assert_eq!(file.name(), "res");
    assert_eq!(file.resource_count(), 4);

    let names: Vec<_> = (0..file.resource_count())
        .map(|i| file.resource_name(i).unwrap().to_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "hello.txt",
            "sfx/boom.wav",
            "textures/crate.tex",
            "textures/shared.txt"
        ]
    );

    assert_eq!(file.raw_size("hello.txt"), 13);
    assert_eq!(file.raw_size("textures"), 0);
    assert_eq!(file.raw_size("missing.txt"), 0);

    let mut out = vec![0; 13];
    assert_eq!(file.copy_raw("hello.txt", &mut out).unwrap(), 13);
    assert_eq!(out, b"Hello, world!");

    assert!(file.copy_raw("missing.txt", &mut out).is_err());
}

#[test]
fn directory_in_cache() {
    let cache = ResourceCache::with_capacity(1024);
    cache
        .register_file(DirectoryFile::new("res", "tests/resources"))
        .unwrap();

    let hello = cache.get("hello.txt").unwrap();
    assert_eq!(hello.as_str(), Some("Hello, world!"));

    let tex = cache.get("textures/crate.tex").unwrap();
    assert_eq!(tex.as_str(), Some("TEX 2x2 rgba8\n"));
    assert_eq!(cache.allocated(), 13 + 14);
}

#[test]
fn zip_archive() {
    let _ = env_logger::try_init();

    let bytes = zip_bytes(&[
        ("hello.txt", b"Hello, zip!"),
        ("textures/crate.tex", b"TEX"),
    ]);

    let mut file = ZipFile::from_bytes("zip", bytes);
    file.open().unwrap();

    assert_eq!(file.resource_count(), 2);
    assert_eq!(file.resource_name(0), Some("hello.txt"));
    assert_eq!(file.resource_name(1), Some("textures/crate.tex"));
    assert_eq!(file.raw_size("hello.txt"), 11);
    assert_eq!(file.raw_size("textures/"), 0);
    assert_eq!(file.raw_size("missing.txt"), 0);

    let mut out = vec![0; 3];
    assert_eq!(file.copy_raw("textures/crate.tex", &mut out).unwrap(), 3);
    assert_eq!(out, b"TEX");

    file.close();
    assert_eq!(file.resource_count(), 0);
    assert_eq!(file.raw_size("hello.txt"), 0);
}

#[test]
fn zip_on_disk() {
    let path = ::std::env::temp_dir().join("rescache-zip-on-disk.zip");
    fs::write(&path, zip_bytes(&[("a.txt", b"zipped")])).unwrap();

    let cache = ResourceCache::with_capacity(1024);
    cache.register_file(ZipFile::new("zip", &path)).unwrap();
    assert_eq!(cache.get("a.txt").unwrap().as_str(), Some("zipped"));

    drop(cache);
    fs::remove_file(&path).unwrap();
}

#[test]
fn pack() {
    let _ = env_logger::try_init();

    let mut builder = PackBuilder::new();
    builder.add_dir("tests/resources").unwrap();
    builder.add("extra/embedded.bin", vec![9; 32]);
    assert_eq!(builder.len(), 5);

    let path = ::std::env::temp_dir().join("rescache-pack.rpak");
    builder.write(fs::File::create(&path).unwrap()).unwrap();

    let mut file = PackFile::new("pack", &path);
    file.open().unwrap();
    assert_eq!(file.resource_count(), 5);
    assert_eq!(file.raw_size("sfx/boom.wav"), 20);
    assert_eq!(file.raw_size("extra/embedded.bin"), 32);

    let mut out = vec![0; 6];
    assert_eq!(file.copy_raw("textures/shared.txt", &mut out).unwrap(), 6);
    assert_eq!(out, b"shared");
    file.close();

    let cache = ResourceCache::with_capacity(1024);
    cache.register_file(PackFile::new("pack", &path)).unwrap();
    assert_eq!(cache.get("hello.txt").unwrap().as_str(), Some("Hello, world!"));
    assert_eq!(cache.get("extra/embedded.bin").unwrap().buffer(), &[9; 32][..]);

    drop(cache);
    fs::remove_file(&path).unwrap();
}

#[test]
fn pack_from_bytes() {
    let mut builder = PackBuilder::new();
    builder.add("a.txt", b"packed".to_vec());

    let cache = ResourceCache::with_capacity(1024);
    cache
        .register_file(PackFile::from_bytes("pack", builder.to_bytes().unwrap()))
        .unwrap();

    assert_eq!(cache.get("a.txt").unwrap().as_str(), Some("packed"));
    assert!(cache.get("b.txt").is_err());
}

#[test]
fn malformed_pack() {
    let cache = ResourceCache::with_capacity(1024);

    match cache.register_file(PackFile::from_bytes("pack", b"RPAK".to_vec())) {
        Err(Error::FileOpen(name, _)) => assert_eq!(name, "pack"),
        _ => panic!("expected an open failure."),
    }

    assert!(cache.file_names().is_empty());
}

#[test]
fn memory() {
    let mut file = MemoryFile::new("mem");
    file.insert("a.txt", b"memory".to_vec());

    let cache = ResourceCache::with_capacity(1024);
    cache.register_file(file).unwrap();
    cache
        .register_file(DirectoryFile::new("res", "tests/resources"))
        .unwrap();

    assert_eq!(cache.file_names(), vec!["mem", "res"]);
    assert_eq!(cache.get("a.txt").unwrap().as_str(), Some("memory"));
    assert_eq!(cache.get("hello.txt").unwrap().size(), 13);
}
