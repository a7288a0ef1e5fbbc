//! Unit tests for pipeline_state.rs

use super::*;
use crate::device::GlDeviceConfig;
use crate::gl_types::GlResourceCategory;
use crate::test_utils::{shader, texture_view, uniform_buffer, CaptureLogger};
use prism_binding::prism::binding::ShaderResourceBinding;
use prism_binding::prism::layout::{ImmutableSamplerDesc, ShaderVariableDesc, VariableType};
use prism_binding::prism::log::LogSeverity;
use prism_binding::prism::resource::{DeviceObject, FilterType, SamplerDesc, TextureViewType};
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderResourceKind};
use prism_binding::prism::{Engine, Error};
use serial_test::serial;

fn attribs(name: &str, kind: ShaderResourceKind, bind_count: u32) -> ShaderResourceAttribs {
    ShaderResourceAttribs::new(name, kind, 0, bind_count)
}

fn device(separable_programs: bool) -> Arc<GlDevice> {
    GlDevice::new(GlDeviceConfig { separable_programs })
}

fn vertex_shader() -> Arc<Shader> {
    shader("VS", ShaderStage::Vertex, vec![attribs("Camera", ShaderResourceKind::ConstantBuffer, 1)], None)
}

fn pixel_shader(extra: bool) -> Arc<Shader> {
    let mut resources = vec![
        attribs("Camera", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Material", ShaderResourceKind::ConstantBuffer, 1),
        attribs("Albedo", ShaderResourceKind::TextureSrv, 1),
    ];
    if extra {
        resources.push(attribs("Extra", ShaderResourceKind::TextureSrv, 1));
    }
    shader("PS", ShaderStage::Pixel, resources, None)
}

fn pipeline_desc(name: &str, shaders: Vec<Arc<Shader>>) -> GlPipelineStateDesc {
    GlPipelineStateDesc {
        name: name.to_string(),
        shaders,
        resource_layout: PipelineResourceLayoutDesc {
            default_variable_type: VariableType::Mutable,
            variables: vec![ShaderVariableDesc::new("Camera", ShaderStageFlags::ALL_GRAPHICS, VariableType::Static)],
            immutable_samplers: vec![ImmutableSamplerDesc::new("Albedo", ShaderStageFlags::PIXEL, SamplerDesc::default())],
        },
        strict_resource_layout: false,
    }
}

fn graphics_pipeline(device: &Arc<GlDevice>, name: &str) -> Arc<GlPipelineState> {
    GlPipelineState::new(device, pipeline_desc(name, vec![vertex_shader(), pixel_shader(false)])).unwrap()
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_pipeline_without_shaders_fails() {
    let result = GlPipelineState::new(&device(false), pipeline_desc("empty", Vec::new()));
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_duplicate_stage_fails() {
    let result = GlPipelineState::new(&device(false), pipeline_desc("dup", vec![pixel_shader(false), pixel_shader(true)]));
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_compute_with_graphics_fails() {
    let cs = shader("CS", ShaderStage::Compute, Vec::new(), None);
    let result = GlPipelineState::new(&device(false), pipeline_desc("mixed", vec![cs, pixel_shader(false)]));
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[serial]
fn test_unmatched_layout_entry_fails_only_in_strict_mode() {
    let logger = CaptureLogger::install();
    let mut desc = pipeline_desc("layout", vec![pixel_shader(false)]);
    desc.resource_layout.variables.push(ShaderVariableDesc::new("Missing", ShaderStageFlags::PIXEL, VariableType::Dynamic));

    assert!(GlPipelineState::new(&device(false), desc.clone()).is_ok());
    assert!(logger.contains(LogSeverity::Warn, "Variable 'Missing' defined in the resource layout is not found"));

    desc.strict_resource_layout = true;
    assert!(matches!(GlPipelineState::new(&device(false), desc), Err(Error::InvalidResource(_))));
    Engine::reset_logger();
}

#[test]
fn test_linked_program_covers_every_stage() {
    let pso = graphics_pipeline(&device(false), "linked");

    assert!(!pso.is_compute());
    assert_eq!(pso.active_stages(), ShaderStageFlags::VERTEX | ShaderStageFlags::PIXEL);
    assert_eq!(pso.programs().len(), 1);
    assert!(matches!(pso.program_object(), GlProgramObject::Program(_)));
    // Camera is shared by both stages of the linked program
    assert_eq!(pso.resource_layout().cache_sizes()[GlResourceCategory::UniformBlock.index()], 2);
}

#[test]
fn test_separable_programs_use_a_program_pipeline() {
    let pso = graphics_pipeline(&device(true), "separable");

    assert_eq!(pso.programs().len(), 2);
    match pso.program_object() {
        GlProgramObject::Pipeline { programs, .. } => assert_eq!(programs.len(), 2),
        other => panic!("expected a program pipeline, got {:?}", other),
    }
    // Each program declares its own Camera block
    assert_eq!(pso.resource_layout().cache_sizes()[GlResourceCategory::UniformBlock.index()], 3);
    assert_eq!(pso.static_variable_count(ShaderStage::Vertex), 1);
    assert_eq!(pso.static_variable_count(ShaderStage::Pixel), 1);
}

#[test]
fn test_single_shader_is_never_separable() {
    let pso = GlPipelineState::new(&device(true), pipeline_desc("single", vec![pixel_shader(false)])).unwrap();
    assert!(matches!(pso.program_object(), GlProgramObject::Program(_)));
}

// ============================================================================
// Compatibility
// ============================================================================

#[test]
fn test_identical_pipelines_are_compatible() {
    let device = device(false);
    let a = graphics_pipeline(&device, "a");
    let b = graphics_pipeline(&device, "b");

    assert_eq!(a.binding_hash(), b.binding_hash());
    assert!(a.is_compatible_with(&b));
    assert!(a.is_compatible_with(&a));
}

#[test]
fn test_extra_resource_makes_pipelines_incompatible() {
    let device = device(false);
    let a = graphics_pipeline(&device, "a");
    let c = GlPipelineState::new(&device, pipeline_desc("c", vec![vertex_shader(), pixel_shader(true)])).unwrap();

    assert_ne!(a.binding_hash(), c.binding_hash());
    assert!(!a.is_compatible_with(&c));
    assert!(!c.is_compatible_with(&a));
}

#[test]
fn test_linked_and_separable_pipelines_are_incompatible() {
    let linked = graphics_pipeline(&device(false), "linked");
    let separable = graphics_pipeline(&device(true), "separable");

    assert!(!linked.is_compatible_with(&separable));
}

// ============================================================================
// Immutable samplers
// ============================================================================

#[test]
fn test_immutable_samplers_are_shared_through_the_device() {
    let device = device(false);
    let a = graphics_pipeline(&device, "a");
    let b = graphics_pipeline(&device, "b");

    assert_eq!(a.immutable_samplers().len(), 1);
    assert!(Arc::ptr_eq(&a.immutable_samplers()[0], &b.immutable_samplers()[0]));

    let point = SamplerDesc { min_filter: FilterType::Point, ..SamplerDesc::default() };
    assert!(!Arc::ptr_eq(&a.immutable_samplers()[0], &device.create_sampler("point", &point)));
}

#[test]
fn test_binding_cache_holds_immutable_samplers() {
    let pso = graphics_pipeline(&device(false), "pso");
    let albedo = pso.resource_layout().find(ShaderStage::Pixel, "Albedo").unwrap();

    let cache = pso.new_binding_cache();

    let sampler = cache.sampler(albedo.attribs().binding).sampler.as_ref().unwrap();
    assert!(Arc::ptr_eq(sampler, &pso.immutable_samplers()[0]));
    assert!(!cache.is_sampler_bound(albedo.attribs().binding));
}

// ============================================================================
// Static variables
// ============================================================================

#[test]
#[serial]
fn test_only_static_variables_are_exposed() {
    let logger = CaptureLogger::install();
    let pso = graphics_pipeline(&device(false), "pso");

    assert!(pso.has_static_resources());
    assert_eq!(pso.static_variable_count(ShaderStage::Pixel), 1);
    assert!(pso.static_variable_by_name(ShaderStage::Pixel, "Camera").is_some());
    assert!(pso.static_variable_by_name(ShaderStage::Pixel, "Material").is_none());

    assert!(pso.static_variable_by_name(ShaderStage::Geometry, "Camera").is_none());
    assert_eq!(pso.static_variable_count(ShaderStage::Geometry), 0);
    assert!(logger.contains(LogSeverity::Warn, "Shader stage geometry is inactive in pipeline state 'pso'"));
    Engine::reset_logger();
}

#[test]
fn test_bind_static_resources_from_mapping() {
    let pso = graphics_pipeline(&device(true), "pso");
    let mut mapping = ResourceMapping::new();
    mapping.add_resource("Camera", uniform_buffer("camera"));

    pso.bind_static_resources(ShaderStageFlags::PIXEL, &mapping, BindShaderResourcesFlags::empty());

    assert!(pso.static_variable_by_name(ShaderStage::Pixel, "Camera").unwrap().is_bound(0));
    // Separable programs keep a Camera block per stage
    assert!(!pso.static_variable_by_name(ShaderStage::Vertex, "Camera").unwrap().is_bound(0));
}

#[test]
fn test_create_binding_with_static_resources() {
    let pso = graphics_pipeline(&device(false), "pso");
    let camera = uniform_buffer("camera");
    pso.static_variable_by_name(ShaderStage::Vertex, "Camera").unwrap().set(Some(DeviceObject::from(Arc::clone(&camera))));

    let lazy = pso.create_shader_resource_binding(false).unwrap();
    assert!(!lazy.static_resources_initialized());

    let srb = pso.create_shader_resource_binding(true).unwrap();
    assert!(srb.static_resources_initialized());
    let binding = pso.resource_layout().find(ShaderStage::Vertex, "Camera").unwrap().attribs().binding;
    let cache = srb.lock_cache();
    assert_eq!(cache.uniform_buffer(binding).buffer.as_ref().map(|b| b.id()), Some(camera.id()));
}

#[test]
fn test_static_cache_is_separate_from_bindings() {
    let pso = graphics_pipeline(&device(false), "pso");
    let srb = pso.create_shader_resource_binding(false).unwrap();

    let albedo = srb.variable_by_name(ShaderStage::Pixel, "Albedo").unwrap();
    albedo.set(Some(DeviceObject::from(texture_view("albedo", TextureViewType::ShaderResource))));

    let binding = pso.resource_layout().find(ShaderStage::Pixel, "Albedo").unwrap().attribs().binding;
    assert!(srb.lock_cache().is_sampler_bound(binding));
    assert!(!lock_cache_of(&pso).is_sampler_bound(binding));
}

fn lock_cache_of(pso: &GlPipelineState) -> std::sync::MutexGuard<'_, ProgramResourceCache> {
    crate::shader_variable::lock_cache(pso.static_cache())
}
