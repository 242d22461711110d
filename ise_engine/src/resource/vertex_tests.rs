/// Tests for Vertex, MeshData and ImageData

use super::*;

#[test]
fn test_vertex_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<Vertex>(), 32);
    let layout = Vertex::layout();
    assert_eq!(layout.stride, 32);
    assert_eq!(layout.attributes.len(), 3);
    assert_eq!(layout.attributes[2].offset, 24);
}

#[test]
fn test_vertex_key_is_bitwise() {
    let a = Vertex::new(Vec3::new(0.0, 1.0, 2.0), Vec3::ONE, Vec2::new(0.5, 0.5));
    let b = Vertex::new(Vec3::new(-0.0, 1.0, 2.0), Vec3::ONE, Vec2::new(0.5, 0.5));

    assert_eq!(a.key(), a.key());
    assert_ne!(a.key(), b.key());
}

#[test]
fn test_vertex_bytes_cast() {
    let vertices = [Vertex::new(Vec3::X, Vec3::ONE, Vec2::ZERO); 2];
    let bytes: &[u8] = bytemuck::cast_slice(&vertices);
    assert_eq!(bytes.len(), 64);
}

#[test]
fn test_mesh_validation() {
    let v = Vertex::new(Vec3::ZERO, Vec3::ONE, Vec2::ZERO);

    assert!(MeshData::new(vec![v; 3], vec![0, 1, 2]).validate().is_ok());
    assert!(MeshData::new(vec![], vec![]).validate().is_err());
    assert!(MeshData::new(vec![v; 3], vec![]).validate().is_err());

    let err = MeshData::new(vec![v; 3], vec![0, 1, 3]).validate().unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn test_image_validation() {
    assert!(ImageData::new(2, 2, vec![0; 16]).validate().is_ok());
    assert!(ImageData::new(2, 2, vec![0; 12]).validate().is_err());
    assert!(ImageData::new(0, 2, vec![]).validate().is_err());
}
