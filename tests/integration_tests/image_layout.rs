// tests/integration_tests/image_layout.rs
use isocdmak::{BuildOptions, Result, TargetSystem};

use crate::integration_tests::common::{
    INPUT, OUTPUT, SECTOR, amiga_options, amiga_tree, both_endian_u32, build_in_memory, sector,
};

#[test]
fn test_image_sizes_match_known_images() -> Result<()> {
    let (summary, image) = build_in_memory(amiga_tree(), amiga_options())?;
    assert_eq!(image.len(), 120_832);
    assert_eq!(summary.bytes_written, 120_832);
    assert_eq!(summary.total_sectors, 59);

    let fs = amiga_tree();
    fs.add_file("/tm/CD32.TM", vec![0xC3; 2048]);
    let options =
        BuildOptions::new(INPUT, OUTPUT, TargetSystem::Cd32).with_trademark_file("/tm/CD32.TM");
    let (summary, image) = build_in_memory(fs, options)?;
    assert_eq!(image.len(), 122_880);
    assert_eq!(summary.trademark_sector, Some(21));

    let fs = amiga_tree();
    fs.add_file("/tm/CDTV.TM", vec![0x7E; 22_152]);
    let options =
        BuildOptions::new(INPUT, OUTPUT, TargetSystem::Cdtv).with_trademark_file("/tm/CDTV.TM");
    let (summary, image) = build_in_memory(fs, options)?;
    assert_eq!(image.len(), 143_360);
    assert_eq!(summary.total_sectors, 70);
    Ok(())
}

#[test]
fn test_volume_descriptors() -> Result<()> {
    let (_, image) = build_in_memory(amiga_tree(), amiga_options())?;

    assert!(image[..16 * SECTOR].iter().all(|&b| b == 0));
    let pvd = sector(&image, 16);
    assert_eq!(pvd, sector(&image, 17));
    assert_eq!(&pvd[..7], b"\x01CD001\x01");
    assert_eq!(&pvd[8..12], b"CDTV");
    assert_eq!(&pvd[40..49], b"CD32_TEST");
    assert_eq!(both_endian_u32(pvd, 80), 59);
    assert_eq!(both_endian_u32(pvd, 132), 30);
    assert_eq!(u32::from_le_bytes(pvd[140..144].try_into().unwrap()), 20);
    assert_eq!(u32::from_be_bytes(pvd[148..152].try_into().unwrap()), 19);
    // Root record, "." form.
    assert_eq!(pvd[156], 34);
    assert_eq!(both_endian_u32(pvd, 158), 21);
    assert_eq!(both_endian_u32(pvd, 166), 2048);
    assert_eq!(&pvd[446..474], b" - ISOCD-Win by Ben Squibb -");
    assert_eq!(&pvd[813..830], b"2000010100000000\0");
    assert_eq!(pvd[881], 1);
    assert_eq!(&pvd[883..888], &[0, b'F', b'S', 0, 0]);

    let terminator = sector(&image, 18);
    assert_eq!(&terminator[..7], b"\xffCD001\x01");
    assert!(terminator[7..].iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn test_path_tables() -> Result<()> {
    let (_, image) = build_in_memory(amiga_tree(), amiga_options())?;

    let big = sector(&image, 19);
    assert_eq!(
        &big[..30],
        &[
            1, 0, 0, 0, 0, 21, 0, 1, 1, 0, // root
            1, 0, 0, 0, 0, 22, 0, 1, b'C', 0, //
            1, 0, 0, 0, 0, 24, 0, 1, b'S', 0,
        ]
    );
    assert!(big[30..].iter().all(|&b| b == 0));

    let little = sector(&image, 20);
    assert_eq!(&little[10..20], &[1, 0, 22, 0, 0, 0, 1, 0, b'C', 0]);
    Ok(())
}

#[test]
fn test_directory_and_file_data() -> Result<()> {
    let (_, image) = build_in_memory(amiga_tree(), amiga_options())?;

    let root = sector(&image, 21);
    assert_eq!((root[0], root[32], root[33]), (34, 1, 0));
    assert_eq!((root[34], root[66], root[67]), (34, 1, 1));
    assert_eq!(both_endian_u32(root, 36), 21);

    // "C", then the readme with its Latin-1 name.
    assert_eq!(root[68], 34);
    assert_eq!(root[68 + 25], 0x02);
    assert_eq!(&root[68 + 33..68 + 34], b"C");
    let readme = 68 + 34;
    assert_eq!(root[readme], 46);
    assert_eq!(both_endian_u32(root, readme + 2), 23);
    assert_eq!(both_endian_u32(root, readme + 10), 20);
    assert_eq!(&root[readme + 33..readme + 45], b"ReadmeCD\xb3\xb2;1");
    assert_eq!(&root[readme + 18..readme + 25], &[100, 1, 1, 0, 0, 0, 0]);

    let data = sector(&image, 23);
    assert_eq!(&data[..20], b"Nothing to see here!");
    assert!(data[20..].iter().all(|&b| b == 0));

    let s_dir = sector(&image, 24);
    assert_eq!(both_endian_u32(s_dir, 34 + 2), 21);
    assert_eq!(&s_dir[68 + 33..68 + 51], b"Startup-sequence;1");

    assert!(image[27 * SECTOR..].iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn test_trademark_is_referenced_from_cdfs_block() -> Result<()> {
    let fs = amiga_tree();
    fs.add_file("/tm/CD32.TM", vec![0xC3; 2048]);
    let options = BuildOptions {
        retries: 5,
        fast_search: false,
        ..BuildOptions::new(INPUT, OUTPUT, TargetSystem::Cd32).with_trademark_file("/tm/CD32.TM")
    };
    let (_, image) = build_in_memory(fs, options)?;

    let pvd = sector(&image, 16);
    assert_eq!(
        &pvd[883..902],
        &[0, b'R', b'C', 0, 2, 0, 5, b'T', b'M', 0, 0x14, 0, 0, 8, 0, 0, 0, 0, 21]
    );
    assert!(sector(&image, 21).iter().all(|&b| b == 0xC3));
    // Root moved one sector along.
    assert_eq!(both_endian_u32(pvd, 158), 22);
    Ok(())
}

#[test]
fn test_empty_trademark_file_keeps_a_zeroed_sector() -> Result<()> {
    let fs = amiga_tree();
    fs.add_file("/tm/CD32.TM", Vec::new());
    let options =
        BuildOptions::new(INPUT, OUTPUT, TargetSystem::Cd32).with_trademark_file("/tm/CD32.TM");
    let (summary, image) = build_in_memory(fs, options)?;

    assert_eq!(summary.total_sectors, 60);
    assert_eq!(image.len(), 60 * SECTOR);
    assert_eq!(summary.trademark_sector, Some(21));
    assert!(sector(&image, 21).iter().all(|&b| b == 0));

    let pvd = sector(&image, 16);
    assert_eq!(both_endian_u32(pvd, 80), 60);
    assert_eq!(both_endian_u32(pvd, 158), 22);
    // No TM record for an empty resource.
    assert_eq!(&pvd[883..888], &[0, b'F', b'S', 0, 0]);
    assert!(pvd[888..890].iter().all(|&b| b == 0));

    let root = sector(&image, 22);
    assert_eq!(both_endian_u32(root, 2), 22);
    Ok(())
}

#[test]
fn test_path_table_names_are_uppercased() -> Result<()> {
    let fs = amiga_tree();
    fs.add_file("/amiga/Devs/Keymaps/usa", b"keys".to_vec());
    let (_, image) = build_in_memory(fs, amiga_options())?;

    let big = sector(&image, 19);
    // Directories: root, C, Devs, S, Keymaps.
    assert_eq!(&big[20..32], &[4, 0, 0, 0, 0, 23, 0, 1, b'D', b'E', b'V', b'S']);
    // Keymaps: sector 27, parent directory 3 (Devs), odd name padded.
    assert_eq!(&big[42..50], &[7, 0, 0, 0, 0, 27, 0, 3]);
    assert_eq!(&big[50..58], b"KEYMAPS\0");

    let root = sector(&image, 21);
    let devs = 68 + 34;
    assert_eq!(&root[devs + 33..devs + 37], b"Devs");
    Ok(())
}

#[test]
fn test_builds_are_reproducible() -> Result<()> {
    let (first, first_image) = build_in_memory(amiga_tree(), amiga_options())?;
    let (second, second_image) = build_in_memory(amiga_tree(), amiga_options())?;

    assert_eq!(first, second);
    assert_eq!(first.crc32, crc32fast::hash(&first_image));
    assert!(first_image == second_image);
    Ok(())
}
