//! Unit tests for shader_variable.rs

use super::*;
use crate::program_resources::{BindingCounters, ProgramResources};
use crate::test_utils::{shader, storage_buffer_view, texture_view, uniform_buffer, CaptureLogger};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, ShaderVariableDesc, VariableTypeFlags};
use prism_binding::prism::log::LogSeverity;
use prism_binding::prism::resource::{BufferViewType, TextureViewType};
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderStageFlags};
use prism_binding::prism::Engine;
use serial_test::serial;

fn attribs(name: &str, kind: ShaderResourceKind, bind_count: u32) -> ShaderResourceAttribs {
    ShaderResourceAttribs::new(name, kind, 0, bind_count)
}

fn desc() -> PipelineResourceLayoutDesc {
    PipelineResourceLayoutDesc {
        default_variable_type: VariableType::Mutable,
        variables: vec![ShaderVariableDesc::new("Lights", ShaderStageFlags::PIXEL, VariableType::Dynamic)],
        immutable_samplers: Vec::new(),
    }
}

/// Layout and cache over a linked vertex + pixel program
fn setup(allowed: VariableTypeFlags) -> (Arc<PipelineResourceLayout>, Arc<Mutex<ProgramResourceCache>>) {
    let vs = shader("VS", ShaderStage::Vertex, vec![attribs("Camera", ShaderResourceKind::ConstantBuffer, 1)], None);
    let ps = shader("PS", ShaderStage::Pixel, vec![
        attribs("Camera", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Textures", ShaderResourceKind::TextureSrv, 2),
        attribs("Lights", ShaderResourceKind::BufferSrv, 1),
    ], None);
    let program = ProgramResources::new(&[vs.resources().as_ref(), ps.resources().as_ref()], &mut BindingCounters::new()).unwrap();
    let layout = PipelineResourceLayout::new("Test PSO", &[program], &desc(), allowed);
    let mut cache = ProgramResourceCache::new();
    layout.init_cache(&mut cache);
    (Arc::new(layout), Arc::new(Mutex::new(cache)))
}

// ============================================================================
// Variable lookup
// ============================================================================

#[test]
fn test_each_stage_sees_its_variables() {
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let vertex = ShaderVariableManager::new(Arc::clone(&layout), ShaderStage::Vertex, Arc::clone(&cache));
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);

    assert_eq!(vertex.variable_count(), 1);
    assert_eq!(pixel.variable_count(), 3);
    assert!(vertex.variable_by_name("Textures").is_none());
    assert_eq!(pixel.stage(), ShaderStage::Pixel);
}

#[test]
fn test_shared_variable_binds_for_both_stages() {
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let vertex = ShaderVariableManager::new(Arc::clone(&layout), ShaderStage::Vertex, Arc::clone(&cache));
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);

    vertex.variable_by_name("Camera").unwrap().set(Some(DeviceObject::from(uniform_buffer("camera"))));

    assert!(pixel.variable_by_name("Camera").unwrap().is_bound(0));
}

#[test]
fn test_allowed_types_filter_variables() {
    let (layout, cache) = setup(VariableTypeFlags::DYNAMIC);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);

    assert_eq!(pixel.variable_count(), 1);
    let lights = pixel.variable_by_index(0).unwrap();
    assert_eq!(lights.name(), "Lights");
    assert_eq!(lights.variable_type(), VariableType::Dynamic);
    assert_eq!(lights.resource_kind(), ShaderResourceKind::BufferSrv);
}

#[test]
fn test_indices_match_lookup_by_name() {
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);

    for index in 0..pixel.variable_count() {
        let var = pixel.variable_by_index(index).unwrap();
        assert_eq!(var.index(), index);
        assert_eq!(pixel.variable_by_name(var.name()).unwrap().index(), index);
    }
}

#[test]
#[serial]
fn test_out_of_range_index_is_logged() {
    let logger = CaptureLogger::install();
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);

    assert!(pixel.variable_by_index(9).is_none());
    assert!(logger.contains(LogSeverity::Error, "Index 9 is out of range. Total variable count: 3"));
    Engine::reset_logger();
}

// ============================================================================
// Binding through variables
// ============================================================================

#[test]
#[serial]
fn test_set_array_stops_at_array_end() {
    let logger = CaptureLogger::install();
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);
    let textures = pixel.variable_by_name("Textures").unwrap();

    let views: Vec<Option<DeviceObject>> = ["a", "b"]
        .iter()
        .map(|name| Some(DeviceObject::from(texture_view(name, TextureViewType::ShaderResource))))
        .collect();
    textures.set_array(&views, 1);

    assert!(!textures.is_bound(0));
    assert!(textures.is_bound(1));
    assert!(!textures.is_bound(2));
    assert!(logger.contains(LogSeverity::Error, "Array index 2 is out of range for variable 'Textures'"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_set_array_rejects_first_element_past_end() {
    let logger = CaptureLogger::install();
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);
    let textures = pixel.variable_by_name("Textures").unwrap();
    let view = Some(DeviceObject::from(texture_view("a", TextureViewType::ShaderResource)));

    textures.set_array(&[view.clone()], u32::MAX);
    textures.set_array(&[view], 2);

    assert!(!textures.is_bound(0));
    assert!(!textures.is_bound(1));
    assert!(logger.contains(LogSeverity::Error, "Array index 4294967295 is out of range for variable 'Textures' of size 2"));
    assert!(logger.contains(LogSeverity::Error, "Array index 2 is out of range for variable 'Textures' of size 2"));
    Engine::reset_logger();
}

#[test]
fn test_bind_resources_respects_update_flags() {
    let (layout, cache) = setup(VariableTypeFlags::ALL);
    let pixel = ShaderVariableManager::new(layout, ShaderStage::Pixel, cache);
    let mut mapping = ResourceMapping::new();
    mapping.add_resource("Camera", uniform_buffer("camera"));
    mapping.add_resource("Lights", storage_buffer_view("lights", BufferViewType::ShaderResource));

    pixel.bind_resources(&mapping, BindShaderResourcesFlags::UPDATE_DYNAMIC);
    assert!(pixel.variable_by_name("Lights").unwrap().is_bound(0));
    assert!(!pixel.variable_by_name("Camera").unwrap().is_bound(0));

    pixel.bind_resources(&mapping, BindShaderResourcesFlags::empty());
    assert!(pixel.variable_by_name("Camera").unwrap().is_bound(0));
    assert!(!pixel.variable_by_name("Textures").unwrap().is_bound(0));
}
