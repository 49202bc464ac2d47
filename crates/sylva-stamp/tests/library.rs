//! Library behaviour over the shared fixtures.

use sylva_stamp::{encode_kernel, read_kernel, KernelError, KernelLibrary, SizeClass};
use sylva_test_utils::{attenuation_kernel, reader_kernel, sample_library, BEECH, SPRUCE};

#[test]
fn larger_trees_get_wider_kernels() {
    let lib = sample_library();
    let small = lib.kernel_for(SPRUCE, 6.0, 3.5).unwrap();
    let large = lib.kernel_for(SPRUCE, 80.0, 50.0).unwrap();
    assert!(small.logical_size() < large.logical_size());
}

#[test]
fn species_keep_distinct_kernels() {
    let lib = sample_library();
    let spruce = lib.lookup(SPRUCE, 25.0, 20.0).unwrap();
    let beech = lib.lookup(BEECH, 25.0, 20.0).unwrap();
    assert_ne!(spruce, beech);
    let a = lib.kernel(spruce).unwrap();
    let b = lib.kernel(beech).unwrap();
    assert_eq!(a.logical_size(), b.logical_size());
    assert!(b.value(a.offset(), a.offset()) < a.value(a.offset(), a.offset()));
}

#[test]
fn every_kernel_has_distances_after_finalize() {
    let lib = sample_library();
    let table = lib.distance_table().unwrap();
    assert_eq!(table.size(), lib.max_internal_size());
    for species in lib.species_ids() {
        for entry in lib.species(species).unwrap().entries() {
            let k = lib.kernel(entry.id).unwrap();
            let edge = k.distance_to_center(0, k.offset() as i32).unwrap();
            assert!((edge - k.offset() as f32 * 2.0).abs() < 1e-6);
        }
    }
}

#[test]
fn readers_share_crown_radius_with_owner() {
    let lib = sample_library();
    for species in lib.species_ids() {
        for entry in lib.species(species).unwrap().entries() {
            let k = lib.kernel(entry.id).unwrap();
            let reader = lib.reader_of(entry.id).unwrap().unwrap();
            assert_eq!(k.crown_radius(), reader.crown_radius());
        }
    }
}

#[test]
fn library_kernels_survive_a_byte_stream() {
    let lib = sample_library();
    let mut stream = Vec::new();
    let mut classes = Vec::new();
    for species in lib.species_ids() {
        for entry in lib.species(species).unwrap().entries() {
            let k = lib.kernel(entry.id).unwrap();
            stream.extend(encode_kernel(k).unwrap());
            classes.push((k.size_class(), k.values().to_vec(), k.offset()));
        }
    }
    let mut r = stream.as_slice();
    for (class, values, offset) in classes {
        let k = read_kernel(&mut r, class).unwrap();
        assert_eq!(k.values(), values.as_slice());
        assert_eq!(k.offset(), offset);
    }
    assert!(matches!(
        read_kernel(&mut r, SizeClass::Px4),
        Err(KernelError::Truncated { .. })
    ));
}

#[test]
fn distance_queries_fail_before_finalize() {
    let mut lib = KernelLibrary::default();
    let id = lib
        .add_kernel(SPRUCE, attenuation_kernel(5, 0.5), 20.0, 60.0, 1.5)
        .unwrap();
    lib.add_reader(reader_kernel(3), 1.5).unwrap();
    assert!(matches!(
        lib.kernel(id).unwrap().distance_to_center(0, 0),
        Err(KernelError::DistanceTableMissing)
    ));
    lib.finalize().unwrap();
    assert!(lib.kernel(id).unwrap().distance_to_center(0, 0).is_ok());
}
