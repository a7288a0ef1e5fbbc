//! Unit tests for program_resources.rs

use super::*;
use crate::test_utils::shader;
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderStage};
use prism_binding::prism::Error;
use serial_test::serial;

fn attribs(name: &str, kind: ShaderResourceKind, bind_count: u32) -> ShaderResourceAttribs {
    ShaderResourceAttribs::new(name, kind, 0, bind_count)
}

fn vertex_resources() -> Vec<ShaderResourceAttribs> {
    vec![
        attribs("Camera", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Bones", ShaderResourceKind::BufferSrv, 1),
    ]
}

fn pixel_resources() -> Vec<ShaderResourceAttribs> {
    vec![
        attribs("Camera", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Material", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Albedo", ShaderResourceKind::TextureSrv, 4),
        attribs("Albedo_sampler", ShaderResourceKind::Sampler, 1),
        attribs("Output", ShaderResourceKind::TextureUav, 1),
    ]
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_resources_are_split_by_category() {
    let ps = shader("PS", ShaderStage::Pixel, pixel_resources(), Some("_sampler"));
    let program = ProgramResources::new(&[ps.resources().as_ref()], &mut BindingCounters::new()).unwrap();

    assert_eq!(program.stages(), ShaderStageFlags::PIXEL);
    assert_eq!(program.uniform_blocks().len(), 2);
    assert_eq!(program.samplers().len(), 1);
    assert_eq!(program.images().len(), 1);
    assert!(program.storage_blocks().is_empty());
    // The separate sampler is folded into its texture
    assert!(program.find("Albedo_sampler").is_none());
    assert_eq!(program.len(), 4);
    assert_eq!(program.combined_sampler_suffix(), Some("_sampler"));
}

#[test]
fn test_bindings_are_assigned_in_order() {
    let ps = shader("PS", ShaderStage::Pixel, pixel_resources(), None);
    let program = ProgramResources::new(&[ps.resources().as_ref()], &mut BindingCounters::new()).unwrap();

    let bindings: Vec<_> = program.uniform_blocks().iter().map(|r| (r.name.as_str(), r.binding)).collect();
    assert_eq!(bindings, vec![("Camera", 0), ("Material", 1)]);
    assert_eq!(program.find("Albedo").unwrap().binding, 0);
    assert_eq!(program.find("Albedo").unwrap().array_size, 4);
    assert_eq!(program.find("Output").unwrap().binding, 0);
}

#[test]
fn test_counters_are_shared_between_programs() {
    let vs = shader("VS", ShaderStage::Vertex, vertex_resources(), None);
    let ps = shader("PS", ShaderStage::Pixel, pixel_resources(), None);
    let mut counters = BindingCounters::new();

    let vertex = ProgramResources::new(&[vs.resources().as_ref()], &mut counters).unwrap();
    let pixel = ProgramResources::new(&[ps.resources().as_ref()], &mut counters).unwrap();

    assert_eq!(vertex.find("Camera").unwrap().binding, 0);
    assert_eq!(pixel.find("Camera").unwrap().binding, 1);
    assert_eq!(pixel.find("Material").unwrap().binding, 2);
    assert_eq!(counters.get(GlResourceCategory::UniformBlock), 3);
    assert_eq!(counters.get(GlResourceCategory::Sampler), 4);
    assert_eq!(counters.get(GlResourceCategory::StorageBlock), 1);
}

#[test]
fn test_linked_program_merges_stages() {
    let vs = shader("VS", ShaderStage::Vertex, vertex_resources(), None);
    let ps = shader("PS", ShaderStage::Pixel, pixel_resources(), None);
    let program = ProgramResources::new(&[vs.resources().as_ref(), ps.resources().as_ref()], &mut BindingCounters::new()).unwrap();

    assert_eq!(program.stages(), ShaderStageFlags::VERTEX | ShaderStageFlags::PIXEL);
    let camera = program.find("Camera").unwrap();
    assert_eq!(camera.stages, ShaderStageFlags::VERTEX | ShaderStageFlags::PIXEL);
    assert_eq!(program.find("Material").unwrap().stages, ShaderStageFlags::PIXEL);
    assert_eq!(program.uniform_blocks().len(), 2);
    assert_eq!(program.name(), "VS+PS");
}

#[test]
#[serial]
fn test_kind_mismatch_between_stages_fails() {
    let vs = shader("VS", ShaderStage::Vertex, vec![attribs("Data", ShaderResourceKind::ConstantBuffer, 1)], None);
    let ps = shader("PS", ShaderStage::Pixel, vec![attribs("Data", ShaderResourceKind::BufferSrv, 1)], None);

    let result = ProgramResources::new(&[vs.resources().as_ref(), ps.resources().as_ref()], &mut BindingCounters::new());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[serial]
fn test_array_size_mismatch_between_stages_fails() {
    let vs = shader("VS", ShaderStage::Vertex, vec![attribs("Lights", ShaderResourceKind::ConstantBuffer, 2)], None);
    let ps = shader("PS", ShaderStage::Pixel, vec![attribs("Lights", ShaderResourceKind::ConstantBuffer, 3)], None);

    let result = ProgramResources::new(&[vs.resources().as_ref(), ps.resources().as_ref()], &mut BindingCounters::new());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// Compatibility
// ============================================================================

#[test]
fn test_identical_programs_are_compatible() {
    let a = shader("PS_A", ShaderStage::Pixel, pixel_resources(), None);
    let mut reversed = pixel_resources();
    reversed.reverse();
    let b = shader("PS_B", ShaderStage::Pixel, reversed, None);

    let pa = ProgramResources::new(&[a.resources().as_ref()], &mut BindingCounters::new()).unwrap();
    let pb = ProgramResources::new(&[b.resources().as_ref()], &mut BindingCounters::new()).unwrap();

    assert_eq!(pa.hash(), pb.hash());
    assert!(pa.is_compatible_with(&pb));
}

#[test]
fn test_renamed_resource_breaks_compatibility() {
    let a = shader("PS", ShaderStage::Pixel, pixel_resources(), None);
    let mut renamed = pixel_resources();
    renamed[1].name = "Surface".to_string();
    let b = shader("PS", ShaderStage::Pixel, renamed, None);

    let pa = ProgramResources::new(&[a.resources().as_ref()], &mut BindingCounters::new()).unwrap();
    let pb = ProgramResources::new(&[b.resources().as_ref()], &mut BindingCounters::new()).unwrap();

    assert_ne!(pa.hash(), pb.hash());
    assert!(!pa.is_compatible_with(&pb));
}

#[test]
fn test_different_base_binding_breaks_compatibility() {
    let ps = shader("PS", ShaderStage::Pixel, pixel_resources(), None);
    let vs = shader("VS", ShaderStage::Vertex, vertex_resources(), None);

    let first = ProgramResources::new(&[ps.resources().as_ref()], &mut BindingCounters::new()).unwrap();
    let mut counters = BindingCounters::new();
    ProgramResources::new(&[vs.resources().as_ref()], &mut counters).unwrap();
    let shifted = ProgramResources::new(&[ps.resources().as_ref()], &mut counters).unwrap();

    assert!(!first.is_compatible_with(&shifted));
}

#[test]
fn test_attribs_compatibility_checks_every_field() {
    let base = GlResourceAttribs {
        name: "Camera".to_string(),
        stages: ShaderStageFlags::VERTEX,
        kind: ShaderResourceKind::ConstantBuffer,
        binding: 0,
        array_size: 1,
    };
    assert!(base.is_compatible_with(&base.clone()));
    assert!(!base.is_compatible_with(&GlResourceAttribs { stages: ShaderStageFlags::PIXEL, ..base.clone() }));
    assert!(!base.is_compatible_with(&GlResourceAttribs { binding: 1, ..base.clone() }));
    assert!(!base.is_compatible_with(&GlResourceAttribs { array_size: 2, ..base.clone() }));
    assert_eq!(base.print_name(0), "Camera");
    assert_eq!(GlResourceAttribs { array_size: 2, ..base }.print_name(1), "Camera[1]");
}
