//! Unit tests for pipeline_resource_layout.rs

use super::*;
use crate::program_resources::BindingCounters;
use crate::test_utils::{sampled_texture_view, shader, storage_buffer_view, texture_view, uniform_buffer, CaptureLogger};
use prism_binding::prism::layout::{ImmutableSamplerDesc, ShaderVariableDesc};
use prism_binding::prism::log::LogSeverity;
use prism_binding::prism::resource::{Buffer, BufferDesc, ResourceState, SamplerDesc, Usage};
use prism_binding::prism::shader::ShaderStageFlags;
use prism_binding::prism::Engine;
use serial_test::serial;

fn linked_program() -> ProgramResources {
    let vs = shader("VS", ShaderStage::Vertex, vec![
        ShaderResourceAttribs::new("Camera", ShaderResourceKind::ConstantBuffer, 0, 1),
        ShaderResourceAttribs::new("Bones", ShaderResourceKind::BufferSrv, 0, 1),
    ], None);
    let ps = shader("PS", ShaderStage::Pixel, vec![
        ShaderResourceAttribs::new("Camera", ShaderResourceKind::ConstantBuffer, 0, 1),
        ShaderResourceAttribs::new("Material", ShaderResourceKind::ConstantBuffer, 1, 1),
        ShaderResourceAttribs::new("Albedo", ShaderResourceKind::TextureSrv, 0, 2),
        ShaderResourceAttribs::new("Output", ShaderResourceKind::TextureUav, 0, 1),
        ShaderResourceAttribs::new("Particles", ShaderResourceKind::BufferUav, 0, 1),
    ], None);
    ProgramResources::new(&[vs.resources().as_ref(), ps.resources().as_ref()], &mut BindingCounters::new()).unwrap()
}

fn layout_desc() -> PipelineResourceLayoutDesc {
    PipelineResourceLayoutDesc {
        default_variable_type: VariableType::Static,
        variables: vec![
            ShaderVariableDesc::new("Material", ShaderStageFlags::PIXEL, VariableType::Mutable),
            ShaderVariableDesc::new("Particles", ShaderStageFlags::PIXEL, VariableType::Dynamic),
        ],
        immutable_samplers: vec![ImmutableSamplerDesc::new("Albedo", ShaderStageFlags::PIXEL, SamplerDesc::default())],
    }
}

fn full_layout() -> PipelineResourceLayout {
    PipelineResourceLayout::new("Test PSO", &[linked_program()], &layout_desc(), VariableTypeFlags::ALL)
}

fn sized_cache(layout: &PipelineResourceLayout) -> ProgramResourceCache {
    let mut cache = ProgramResourceCache::new();
    layout.init_cache(&mut cache);
    cache
}

fn var<'a>(layout: &'a PipelineResourceLayout, name: &str) -> &'a GlVariable {
    layout.find(ShaderStage::Pixel, name)
        .or_else(|| layout.find(ShaderStage::Vertex, name))
        .unwrap()
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_variable_types_follow_overrides() {
    let layout = full_layout();

    assert_eq!(var(&layout, "Camera").var_type(), VariableType::Static);
    assert_eq!(var(&layout, "Material").var_type(), VariableType::Mutable);
    assert_eq!(var(&layout, "Particles").var_type(), VariableType::Dynamic);
    assert_eq!(layout.total_variable_count(), 6);
}

#[test]
fn test_override_in_one_stage_applies_to_merged_resource() {
    let mut desc = layout_desc();
    desc.variables.push(ShaderVariableDesc::new("Camera", ShaderStageFlags::PIXEL, VariableType::Dynamic));
    let layout = PipelineResourceLayout::new("Test PSO", &[linked_program()], &desc, VariableTypeFlags::ALL);

    assert_eq!(var(&layout, "Camera").var_type(), VariableType::Dynamic);
}

#[test]
fn test_allowed_types_filter_variables() {
    let program = linked_program();
    let statics = PipelineResourceLayout::new("Test PSO", std::slice::from_ref(&program), &layout_desc(), VariableTypeFlags::STATIC);
    let others = PipelineResourceLayout::new("Test PSO", &[program], &layout_desc(), VariableTypeFlags::MUTABLE_DYNAMIC);

    assert!(statics.find(ShaderStage::Pixel, "Camera").is_some());
    assert!(statics.find(ShaderStage::Pixel, "Material").is_none());
    assert!(others.find(ShaderStage::Pixel, "Material").is_some());
    assert!(others.find(ShaderStage::Pixel, "Camera").is_none());
    assert_eq!(statics.total_variable_count() + others.total_variable_count(), 6);
}

#[test]
fn test_stage_lists_hold_shared_variables() {
    let layout = full_layout();

    let vertex: Vec<_> = layout.stage_variables(ShaderStage::Vertex).iter().map(|&r| layout.variable(r).name()).collect();
    assert_eq!(vertex, vec!["Camera", "Bones"]);
    assert_eq!(layout.stage_variables(ShaderStage::Pixel).len(), 5);
    assert!(layout.stage_variables(ShaderStage::Compute).is_empty());
}

#[test]
fn test_cache_sizes_cover_every_binding() {
    let layout = full_layout();

    // Camera and Material; Albedo[2]; Output; Bones and Particles
    assert_eq!(layout.cache_sizes(), [2, 2, 1, 2]);

    let statics = PipelineResourceLayout::new("Test PSO", &[linked_program()], &layout_desc(), VariableTypeFlags::STATIC);
    // Material at binding 1 is not static, Particles at binding 1 is dynamic
    assert_eq!(statics.cache_sizes(), [1, 2, 1, 1]);
}

#[test]
fn test_immutable_sampler_is_resolved_for_textures() {
    let layout = full_layout();

    assert_eq!(var(&layout, "Albedo").immutable_sampler(), Some(0));
    assert_eq!(var(&layout, "Output").immutable_sampler(), None);
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn test_bind_each_category() {
    let layout = full_layout();
    let mut cache = sized_cache(&layout);

    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(uniform_buffer("camera"))), 0, &mut cache);
    layout.bind_resource(var(&layout, "Albedo"), Some(&DeviceObject::from(sampled_texture_view("albedo"))), 1, &mut cache);
    layout.bind_resource(var(&layout, "Output"),
        Some(&DeviceObject::from(texture_view("output", TextureViewType::UnorderedAccess))), 0, &mut cache);
    layout.bind_resource(var(&layout, "Bones"),
        Some(&DeviceObject::from(storage_buffer_view("bones", BufferViewType::ShaderResource))), 0, &mut cache);

    assert!(layout.is_bound(var(&layout, "Camera"), 0, &cache));
    assert!(!layout.is_bound(var(&layout, "Albedo"), 0, &cache));
    assert!(layout.is_bound(var(&layout, "Albedo"), 1, &cache));
    assert!(layout.is_bound(var(&layout, "Output"), 0, &cache));
    assert!(layout.is_bound(var(&layout, "Bones"), 0, &cache));
    assert!(!layout.is_bound(var(&layout, "Particles"), 0, &cache));
    assert!(!layout.is_bound(var(&layout, "Camera"), 3, &cache));
}

#[test]
fn test_texture_with_immutable_sampler_keeps_it() {
    let layout = full_layout();
    let mut cache = sized_cache(&layout);
    let immutable = Sampler::new("linear", SamplerDesc::default());
    layout.init_immutable_samplers(&mut cache, &[Arc::clone(&immutable)]);

    layout.bind_resource(var(&layout, "Albedo"), Some(&DeviceObject::from(sampled_texture_view("albedo"))), 0, &mut cache);

    let binding = var(&layout, "Albedo").attribs().binding;
    assert_eq!(cache.sampler(binding).sampler.as_ref().unwrap().id(), immutable.id());
    assert_eq!(cache.sampler(binding + 1).sampler.as_ref().unwrap().id(), immutable.id());
}

#[test]
#[serial]
fn test_wrong_resource_type_is_rejected() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);

    layout.bind_resource(var(&layout, "Camera"),
        Some(&DeviceObject::from(texture_view("albedo", TextureViewType::ShaderResource))), 0, &mut cache);

    assert!(!layout.is_bound(var(&layout, "Camera"), 0, &cache));
    assert!(logger.contains(LogSeverity::Error, "Invalid resource type: buffer is expected"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_wrong_view_type_is_rejected() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);

    layout.bind_resource(var(&layout, "Particles"),
        Some(&DeviceObject::from(storage_buffer_view("particles", BufferViewType::ShaderResource))), 0, &mut cache);
    layout.bind_resource(var(&layout, "Output"),
        Some(&DeviceObject::from(texture_view("output", TextureViewType::ShaderResource))), 0, &mut cache);

    assert!(!layout.is_bound(var(&layout, "Particles"), 0, &cache));
    assert!(!layout.is_bound(var(&layout, "Output"), 0, &cache));
    assert_eq!(logger.count(LogSeverity::Error), 2);
    assert!(logger.contains(LogSeverity::Error, "Incorrect view type"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_buffer_without_uniform_flag_is_rejected() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);
    let buffer = Buffer::new(BufferDesc {
        name: "raw".to_string(),
        size: 64,
        usage: Usage::Default,
        bind_flags: BindFlags::SHADER_RESOURCE,
    }, ResourceState::SHADER_RESOURCE);

    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(buffer)), 0, &mut cache);

    assert!(!layout.is_bound(var(&layout, "Camera"), 0, &cache));
    assert!(logger.contains(LogSeverity::Error, "BindFlags::UNIFORM_BUFFER"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_static_variable_cannot_be_rebound() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);
    let first = uniform_buffer("first");

    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(Arc::clone(&first))), 0, &mut cache);
    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(Arc::clone(&first))), 0, &mut cache);
    assert_eq!(logger.count(LogSeverity::Error), 0);

    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(uniform_buffer("second"))), 0, &mut cache);

    let binding = var(&layout, "Camera").attribs().binding;
    assert_eq!(cache.uniform_buffer(binding).buffer.as_ref().unwrap().id(), first.id());
    assert!(logger.contains(LogSeverity::Error, "is already bound to static shader variable 'Camera'"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_dynamic_variable_can_be_rebound() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);
    let particles = var(&layout, "Particles");

    layout.bind_resource(particles,
        Some(&DeviceObject::from(storage_buffer_view("a", BufferViewType::UnorderedAccess))), 0, &mut cache);
    layout.bind_resource(particles,
        Some(&DeviceObject::from(storage_buffer_view("b", BufferViewType::UnorderedAccess))), 0, &mut cache);
    layout.bind_resource(particles, None, 0, &mut cache);

    assert!(!layout.is_bound(particles, 0, &cache));
    assert_eq!(logger.count(LogSeverity::Error), 0);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_resetting_bound_static_variable_is_reported() {
    let logger = CaptureLogger::install();
    let layout = full_layout();
    let mut cache = sized_cache(&layout);

    layout.bind_resource(var(&layout, "Camera"), Some(&DeviceObject::from(uniform_buffer("camera"))), 0, &mut cache);
    layout.bind_resource(var(&layout, "Camera"), None, 0, &mut cache);

    assert!(!layout.is_bound(var(&layout, "Camera"), 0, &cache));
    assert!(logger.contains(LogSeverity::Error, "is being reset to null"));
    Engine::reset_logger();
}

// ============================================================================
// Static resources
// ============================================================================

#[test]
fn test_copy_resources_copies_layout_slots() {
    let statics = PipelineResourceLayout::new("Test PSO", &[linked_program()], &layout_desc(), VariableTypeFlags::STATIC);
    let mut src = sized_cache(&statics);
    let camera = uniform_buffer("camera");
    statics.bind_resource(statics.find(ShaderStage::Pixel, "Camera").unwrap(),
        Some(&DeviceObject::from(Arc::clone(&camera))), 0, &mut src);

    let full = full_layout();
    let mut dst = sized_cache(&full);
    statics.copy_resources(&src, &mut dst);

    assert!(full.is_bound(var(&full, "Camera"), 0, &dst));
    assert_eq!(dst.uniform_buffer(0).buffer.as_ref().unwrap().id(), camera.id());
    assert!(!full.is_bound(var(&full, "Material"), 0, &dst));
}

#[test]
#[serial]
fn test_verify_bindings_reports_missing_resources() {
    let logger = CaptureLogger::install();
    let statics = PipelineResourceLayout::new("Test PSO", &[linked_program()], &layout_desc(), VariableTypeFlags::STATIC);
    let mut cache = sized_cache(&statics);

    assert!(!statics.verify_bindings(&cache));
    assert!(logger.contains(LogSeverity::Error, "No resource is bound to static variable 'Camera'"));
    assert!(logger.contains(LogSeverity::Error, "No resource is bound to static variable 'Albedo[1]'"));

    for name in ["Camera", "Bones", "Output"] {
        let var = statics.find(ShaderStage::Pixel, name).or_else(|| statics.find(ShaderStage::Vertex, name)).unwrap();
        let object = match var.attribs().kind {
            ShaderResourceKind::ConstantBuffer => DeviceObject::from(uniform_buffer(name)),
            ShaderResourceKind::BufferSrv => DeviceObject::from(storage_buffer_view(name, BufferViewType::ShaderResource)),
            _ => DeviceObject::from(texture_view(name, TextureViewType::UnorderedAccess)),
        };
        statics.bind_resource(var, Some(&object), 0, &mut cache);
    }
    let albedo = statics.find(ShaderStage::Pixel, "Albedo").unwrap();
    for element in 0..2 {
        statics.bind_resource(albedo, Some(&DeviceObject::from(sampled_texture_view("albedo"))), element, &mut cache);
    }

    // Bound, but the immutable sampler was never written
    assert!(!statics.verify_bindings(&cache));
    assert!(logger.contains(LogSeverity::Error, "Immutable sampler is not initialized for texture 'Albedo'"));

    statics.init_immutable_samplers(&mut cache, &[Sampler::new("linear", SamplerDesc::default())]);
    assert!(statics.verify_bindings(&cache));
    Engine::reset_logger();
}
