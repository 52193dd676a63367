// tests/integration_tests/host_build.rs
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};

use isocdmak::iso::VolumeTimestamp;
use isocdmak::progress::{CancelToken, Progress};
use isocdmak::{
    BuildError, BuildOptions, BuildWorker, Completion, ImageBuilder, TargetSystem, WorkerEvent,
    build_image,
};
use tempfile::tempdir;

use crate::integration_tests::common::{SECTOR, both_endian_u32, init_tracing};

fn write_amiga_tree(root: &std::path::Path) -> io::Result<()> {
    fs::create_dir_all(root.join("C"))?;
    fs::create_dir_all(root.join("S"))?;
    fs::write(root.join("ReadmeCD³²"), b"Nothing to see here!")?;
    fs::write(root.join("C").join("cls"), vec![0x4e; 300])?;
    fs::write(root.join("S").join("Startup-sequence"), b"C:cls\n")?;
    fs::write(root.join("_UAEFSDB.___"), vec![0u8; 600])?;
    Ok(())
}

#[test]
fn test_build_image_on_disk() -> io::Result<()> {
    init_tracing();
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("cd");
    write_amiga_tree(&input)?;
    let iso_path = temp_dir.path().join("cd32.iso");

    let options = BuildOptions::new(&input, &iso_path, TargetSystem::Amiga);
    let summary = build_image(options).map_err(io::Error::other)?;

    // The attribute database is left out, so the size matches the in-memory tree.
    assert_eq!(summary.entries, 6);
    assert_eq!(fs::metadata(&iso_path)?.len(), 120_832);

    let mut iso = File::open(&iso_path)?;
    iso.seek(SeekFrom::Start(16 * SECTOR as u64))?;
    let mut pvd = vec![0u8; SECTOR];
    iso.read_exact(&mut pvd)?;
    assert_eq!(&pvd[1..6], b"CD001");
    assert_eq!(both_endian_u32(&pvd, 80), 59);

    let mut image = Vec::new();
    iso.seek(SeekFrom::Start(0))?;
    iso.read_to_end(&mut image)?;
    assert_eq!(crc32fast::hash(&image), summary.crc32);
    Ok(())
}

#[test]
fn test_fixed_timestamp_on_disk_is_reproducible() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("cd");
    write_amiga_tree(&input)?;
    let first_path = temp_dir.path().join("first.iso");
    let second_path = temp_dir.path().join("second.iso");

    for path in [&first_path, &second_path] {
        let options = BuildOptions::new(&input, path, TargetSystem::Amiga);
        ImageBuilder::new(options)
            .with_timestamp(VolumeTimestamp::REPRODUCIBLE)
            .build(&CancelToken::new(), &mut |_: Progress| {})
            .map_err(io::Error::other)?;
    }

    assert!(fs::read(&first_path)? == fs::read(&second_path)?);
    Ok(())
}

#[test]
fn test_worker_on_disk() -> io::Result<()> {
    init_tracing();
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("cd");
    write_amiga_tree(&input)?;
    let tm_path = temp_dir.path().join("CD32.TM");
    fs::write(&tm_path, vec![0x11; 2048])?;
    let iso_path = temp_dir.path().join("cd32.iso");

    let options =
        BuildOptions::new(&input, &iso_path, TargetSystem::Cd32).with_trademark_file(&tm_path);
    let worker = BuildWorker::spawn(options)?;

    let mut last_percent = 0;
    let completion = loop {
        match worker.events().recv() {
            Ok(WorkerEvent::Progress(p)) => {
                assert!(p.percent >= last_percent);
                last_percent = p.percent;
            }
            Ok(WorkerEvent::Completed(done)) => break done,
            Err(e) => return Err(io::Error::other(e)),
        }
    };
    drop(worker);

    assert_eq!(last_percent, 100);
    match completion {
        Completion::Success(summary) => {
            assert_eq!(summary.trademark_sector, Some(21));
            assert_eq!(fs::metadata(&iso_path)?.len(), 122_880);
        }
        other => panic!("expected success, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_worker_reports_missing_output_folder() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("cd");
    write_amiga_tree(&input)?;
    let iso_path = temp_dir.path().join("missing").join("cd.iso");

    let options = BuildOptions::new(&input, &iso_path, TargetSystem::Amiga);
    let completion = BuildWorker::spawn(options)?.wait(|_| {});

    assert!(matches!(
        completion,
        Completion::Error(BuildError::OutputFolderMissing(_))
    ));
    assert!(!iso_path.exists());
    Ok(())
}
