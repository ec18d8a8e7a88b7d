use brainio::convert::{load_any, nii_to_tiff, nii_to_tiffs, save_any, tiffs_to_nii};
use brainio::errors::BrainIoError;
use brainio::nifti_io::{load_nii, to_nii};
use brainio::paths::PathSpec;
use brainio::resources::{FixedCores, FixedMemory};
use brainio::stack_io::{
    load_from_folder, load_img_sequence, load_planes, load_stack_with, plane_byte_size,
    read_plane, to_tiffs, write_plane, StackLoadOptions,
};
use brainio::tiff_io::{load_img_stack, load_img_stack_with, to_tiff};
use image::{ImageBuffer, Luma, Rgb};
use ndarray::{array, Array2, Array3};
use std::fs::{self, File};
use tempfile::tempdir;
use tiff::encoder::{colortype, TiffEncoder};

/// v[x, y, z] = (y + 1) * (z + 1), the same 4x4x4 ramp used across the suite
fn start_array() -> Array3<u16> {
    Array3::from_shape_fn((4, 4, 4), |(_, y, z)| ((y + 1) * (z + 1)) as u16)
}

/// Non-square volume so a transposed plane would be caught
fn tall_array() -> Array3<u16> {
    Array3::from_shape_fn((5, 3, 12), |(x, y, z)| (x * 100 + y * 10 + z) as u16)
}

#[test]
fn test_to_tiffs_and_load_from_folder() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = tall_array();

    let written = to_tiffs(&volume, temp_dir.path().join("start_array"), None)
        .expect("Failed to write planes");
    assert_eq!(written.len(), 12);
    assert!(written[0].ends_with("start_array_00.tif"));
    assert!(written[11].ends_with("start_array_11.tif"));

    let sequential = load_from_folder(temp_dir.path(), &StackLoadOptions::sequential())
        .expect("Failed to load sequentially");
    assert_eq!(sequential, volume);

    let parallel = load_from_folder(temp_dir.path(), &StackLoadOptions::default())
        .expect("Failed to load in parallel");
    assert_eq!(parallel, volume);
}

#[test]
fn test_load_img_sequence() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let planes_dir = temp_dir.path().join("sub");
    let volume = start_array();
    let written = to_tiffs(&volume, planes_dir.join("start_array"), None)
        .expect("Failed to write planes");

    // Manifest written out of order; resolution restores depth order
    let mut lines: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    lines.reverse();
    let manifest = temp_dir.path().join("imgs_file.txt");
    fs::write(&manifest, lines.join("\n")).expect("Failed to write manifest");

    let reloaded =
        load_img_sequence(&manifest, &StackLoadOptions::default()).expect("Failed to load");
    assert_eq!(reloaded, volume);
}

#[test]
fn test_load_planes_from_list() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    let written = to_tiffs(&volume, temp_dir.path().join("plane"), Some(".png"))
        .expect("Failed to write planes");
    assert!(written[0].extension().is_some_and(|e| e == "png"));

    let paths: Vec<String> = written.iter().rev().map(|p| p.display().to_string()).collect();
    let reloaded = load_planes(&paths, &StackLoadOptions::sequential()).expect("Failed to load");
    assert_eq!(reloaded, volume);
}

#[test]
fn test_extension_filter_skips_other_files() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    to_tiffs(&volume, temp_dir.path().join("start_array"), None).expect("Failed to write planes");
    fs::write(temp_dir.path().join("notes.md"), "not a plane").expect("Failed to write notes");

    let options = StackLoadOptions::sequential().with_extension(".tif");
    let reloaded = load_from_folder(temp_dir.path(), &options).expect("Failed to load");
    assert_eq!(reloaded, volume);

    // Without the filter the notes file is handed to the decoder
    assert!(load_from_folder(temp_dir.path(), &StackLoadOptions::sequential()).is_err());
}

#[test]
fn test_memory_check_runs_before_allocation() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    to_tiffs(&volume, temp_dir.path().join("start_array"), None).expect("Failed to write planes");

    let spec = PathSpec::Directory(temp_dir.path().to_path_buf());
    let needed = plane_byte_size(4, 4) * 4;
    assert_eq!(needed, 128);

    let result = load_stack_with(
        &spec,
        &StackLoadOptions::default(),
        &FixedCores(4),
        &FixedMemory(needed),
    );
    match result {
        Err(BrainIoError::InsufficientMemory {
            requested,
            available,
        }) => {
            assert_eq!(requested, 128);
            assert_eq!(available, 128);
        }
        other => panic!("Expected InsufficientMemory, got {other:?}"),
    }

    let reloaded = load_stack_with(
        &spec,
        &StackLoadOptions::default(),
        &FixedCores(4),
        &FixedMemory(needed + 1),
    )
    .expect("Failed to load with enough memory");
    assert_eq!(reloaded, volume);
}

#[test]
fn test_zero_budget_still_loads() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    to_tiffs(&volume, temp_dir.path().join("start_array"), None).expect("Failed to write planes");

    let spec = PathSpec::Directory(temp_dir.path().to_path_buf());
    let options = StackLoadOptions {
        min_free_cores: 8,
        ..StackLoadOptions::default()
    };
    let reloaded = load_stack_with(&spec, &options, &FixedCores(2), &FixedMemory(u64::MAX))
        .expect("Failed to load");
    assert_eq!(reloaded, volume);
}

#[test]
fn test_empty_and_mismatched_stacks() {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    assert!(matches!(
        load_from_folder(temp_dir.path(), &StackLoadOptions::default()),
        Err(BrainIoError::EmptyStack { .. })
    ));

    write_plane(Array2::<u16>::zeros((4, 4)).view(), temp_dir.path().join("p1.tif"))
        .expect("Failed to write plane");
    write_plane(Array2::<u16>::zeros((4, 5)).view(), temp_dir.path().join("p2.tif"))
        .expect("Failed to write plane");

    match load_from_folder(temp_dir.path(), &StackLoadOptions::sequential()) {
        Err(BrainIoError::PlaneMismatch { expected, got, .. }) => {
            assert_eq!(expected, (4, 4));
            assert_eq!(got, (4, 5));
        }
        other => panic!("Expected PlaneMismatch, got {other:?}"),
    }
}

#[test]
fn test_8bit_planes_keep_stored_values() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    for z in 0..2u8 {
        let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(2, 2, vec![0, 1, 3, 255 - z]).expect("Failed to build plane");
        buffer
            .save(temp_dir.path().join(format!("plane_{z}.tif")))
            .expect("Failed to save plane");
    }

    let plane = read_plane(temp_dir.path().join("plane_0.tif")).expect("Failed to read plane");
    assert_eq!(plane, array![[0u16, 1], [3, 255]]);

    let volume = load_from_folder(temp_dir.path(), &StackLoadOptions::default())
        .expect("Failed to load 8-bit stack");
    assert_eq!(volume.shape(), &[2, 2, 2]);
    assert_eq!(volume[[1, 1, 0]], 255);
    assert_eq!(volume[[1, 1, 1]], 254);
    assert_eq!(volume[[0, 1, 1]], 1);
}

#[test]
fn test_colour_planes_are_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("rgb.png");
    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).expect("Failed to build plane");
    buffer.save(&path).expect("Failed to save plane");

    assert!(matches!(
        read_plane(&path),
        Err(BrainIoError::UnsupportedPixelType { .. })
    ));
}

#[test]
fn test_load_with_xy_scaling() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    to_tiffs(&volume, temp_dir.path().join("start_array"), None).expect("Failed to write planes");
    let spec = PathSpec::Directory(temp_dir.path().to_path_buf());

    // Doubling the rows doubles the memory needed: 8 * 4 * 2 bytes * 4 planes
    let options = StackLoadOptions::default().with_scaling(2.0, 1.0);
    match load_stack_with(&spec, &options, &FixedCores(4), &FixedMemory(200)) {
        Err(BrainIoError::InsufficientMemory { requested, .. }) => assert_eq!(requested, 256),
        other => panic!("Expected InsufficientMemory, got {other:?}"),
    }

    // Values depend only on y and z; halving y keeps the first and last columns
    let options = StackLoadOptions::default().with_scaling(2.0, 0.5);
    let scaled = load_stack_with(&spec, &options, &FixedCores(4), &FixedMemory(u64::MAX))
        .expect("Failed to load scaled stack");
    let expected = Array3::from_shape_fn((8, 2, 4), |(_, y, z)| ((1 + 3 * y) * (z + 1)) as u16);
    assert_eq!(scaled, expected);

    let options = StackLoadOptions::sequential().with_scaling(2.0, 0.5);
    let sequential =
        load_from_folder(temp_dir.path(), &options).expect("Failed to load scaled stack");
    assert_eq!(sequential, expected);

    let options = StackLoadOptions::default().with_scaling(0.0, 1.0);
    assert!(matches!(
        load_from_folder(temp_dir.path(), &options),
        Err(BrainIoError::InvalidScaleFactor { .. })
    ));
}

#[test]
fn test_to_tiff_and_load_img_stack() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = tall_array();
    let tiff_path = temp_dir.path().join("nested").join("stack.tif");

    to_tiff(&volume, &tiff_path).expect("Failed to write TIFF stack");
    let reloaded = load_img_stack(&tiff_path).expect("Failed to read TIFF stack");
    assert_eq!(reloaded, volume);

    // 5 x 3 plane, 2 bytes per voxel, 12 pages
    match load_img_stack_with(&tiff_path, &FixedMemory(360)) {
        Err(BrainIoError::InsufficientMemory { requested, .. }) => assert_eq!(requested, 360),
        other => panic!("Expected InsufficientMemory, got {other:?}"),
    }
}

#[test]
fn test_load_img_stack_widens_8bit_pages() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let tiff_path = temp_dir.path().join("stack8.tiff");
    {
        let mut encoder =
            TiffEncoder::new(File::create(&tiff_path).expect("Failed to create file"))
                .expect("Failed to start encoder");
        for page in [[0u8, 1, 2, 3, 4, 5], [250, 251, 252, 253, 254, 255]] {
            encoder
                .write_image::<colortype::Gray8>(3, 2, &page)
                .expect("Failed to write page");
        }
    }

    let volume = load_img_stack(&tiff_path).expect("Failed to read TIFF stack");
    assert_eq!(volume.shape(), &[2, 3, 2]);
    assert_eq!(volume[[0, 1, 0]], 1);
    assert_eq!(volume[[1, 2, 0]], 5);
    assert_eq!(volume[[1, 2, 1]], 255);
}

#[test]
fn test_nii_to_tiff() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    let nii_path = temp_dir.path().join("test_array.nii.gz");
    let tiff_path = temp_dir.path().join("test_array.tiff");

    to_nii(&volume, &nii_path).expect("Failed to write NIfTI");
    nii_to_tiff(&nii_path, &tiff_path).expect("Failed to convert");
    assert_eq!(load_img_stack(&tiff_path).expect("Failed to read TIFF stack"), volume);
}

#[test]
fn test_to_nii_and_load_nii() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = tall_array();

    for name in ["test_array.nii", "test_array.nii.gz"] {
        let nii_path = temp_dir.path().join(name);
        to_nii(&volume, &nii_path).expect("Failed to write NIfTI");
        let reloaded = load_nii(&nii_path).expect("Failed to read NIfTI");
        assert_eq!(reloaded, volume, "round trip through {name}");
    }
}

#[test]
fn test_nii_to_tiffs() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    let nii_path = temp_dir.path().join("test_array.nii.gz");
    let tiffs_dir = temp_dir.path().join("tiffs");

    to_nii(&volume, &nii_path).expect("Failed to write NIfTI");
    let written = nii_to_tiffs(&nii_path, &tiffs_dir).expect("Failed to convert");
    assert_eq!(written.len(), 4);
    assert!(written[0].ends_with("test_array_0.tif"));

    let reloaded =
        load_from_folder(&tiffs_dir, &StackLoadOptions::default()).expect("Failed to load");
    assert_eq!(reloaded, volume);
}

#[test]
fn test_tiffs_to_nii() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();
    let tiffs_dir = temp_dir.path().join("tiffs");
    to_tiffs(&volume, tiffs_dir.join("start_array"), None).expect("Failed to write planes");

    let nii_path = temp_dir.path().join("test_array.nii.gz");
    tiffs_to_nii(&tiffs_dir, &nii_path, &StackLoadOptions::default()).expect("Failed to convert");
    assert_eq!(load_nii(&nii_path).expect("Failed to read NIfTI"), volume);
}

#[test]
fn test_load_any_and_save_any() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = tall_array();
    let options = StackLoadOptions::default();

    let planes_dir = temp_dir.path().join("planes");
    let written = save_any(&volume, &planes_dir).expect("Failed to save planes");
    assert_eq!(written.len(), 12);
    assert_eq!(load_any(&planes_dir, &options).expect("directory"), volume);

    let manifest = temp_dir.path().join("planes.txt");
    let lines: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    fs::write(&manifest, lines.join("\n")).expect("Failed to write manifest");
    assert_eq!(load_any(&manifest, &options).expect("manifest"), volume);

    let nii_path = temp_dir.path().join("volume.nii");
    save_any(&volume, &nii_path).expect("Failed to save NIfTI");
    assert_eq!(load_any(&nii_path, &options).expect("nifti"), volume);

    let tiff_path = temp_dir.path().join("volume.tif");
    let written = save_any(&volume, &tiff_path).expect("Failed to save TIFF");
    assert_eq!(written, vec![tiff_path.clone()]);
    assert_eq!(load_any(&tiff_path, &options).expect("tiff"), volume);

    let unknown = temp_dir.path().join("volume.raw");
    fs::write(&unknown, b"").expect("Failed to write file");
    assert!(matches!(
        load_any(&unknown, &options),
        Err(BrainIoError::UnrecognizedInputFormat { .. })
    ));
}

#[test]
fn test_load_any_checks_manifest_suffix_before_directory() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let volume = start_array();

    // A directory of valid planes, but its name claims a manifest
    let dir = temp_dir.path().join("planes.txt");
    to_tiffs(&volume, dir.join("start_array"), None).expect("Failed to write planes");

    assert!(matches!(
        load_any(&dir, &StackLoadOptions::default()),
        Err(BrainIoError::IoError(_))
    ));
    assert!(matches!(
        PathSpec::infer(&dir.to_string_lossy()),
        Ok(PathSpec::ManifestFile(_))
    ));
}
