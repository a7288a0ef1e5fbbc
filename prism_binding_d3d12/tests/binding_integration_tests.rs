//! Integration tests for the D3D12 binding backend
//!
//! These tests drive layouts, pipeline states, shader resource bindings and a
//! device context through the public API only. No GPU required.
//!
//! Run with: cargo test -p prism_binding_d3d12 --test binding_integration_tests

use prism_binding::prism::binding::{PipelineState, ResourceStateTransitionMode, ShaderResourceBinding};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, ShaderVariableDesc, VariableType};
use prism_binding::prism::log::{LogEntry, LogSeverity, Logger};
use prism_binding::prism::resource::{
    BindFlags, Buffer, BufferDesc, DeviceObject, ResourceState, Sampler, SamplerDesc, Texture, TextureDesc,
    TextureView, TextureViewType, Usage,
};
use prism_binding::prism::shader::{
    Shader, ShaderDesc, ShaderResourceAttribs, ShaderResourceKind, ShaderStage, ShaderStageFlags,
};
use prism_binding::prism::Engine;
use prism_binding_d3d12::{
    D3D12Command, D3D12Device, D3D12DeviceConfig, D3D12PipelineState, D3D12PipelineStateDesc,
    D3D12ShaderResourceBinding, GpuVirtualAddress,
};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures severities and messages
struct TestLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl TestLogger {
    fn install() -> Arc<Mutex<Vec<(LogSeverity, String)>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        Engine::set_logger(TestLogger { entries: entries.clone() });
        entries
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

fn logged(entries: &Mutex<Vec<(LogSeverity, String)>>, severity: LogSeverity, text: &str) -> bool {
    entries.lock().unwrap().iter().any(|(s, m)| *s == severity && m.contains(text))
}

// ============================================================================
// HELPERS
// ============================================================================

fn res(name: &str, kind: ShaderResourceKind, bind_point: u32, bind_count: u32) -> ShaderResourceAttribs {
    ShaderResourceAttribs::new(name, kind, bind_point, bind_count)
}

fn make_shader(name: &str, stage: ShaderStage, resources: Vec<ShaderResourceAttribs>) -> Arc<Shader> {
    Arc::new(
        Shader::new(ShaderDesc {
            name: name.to_string(),
            stage,
            resources,
            combined_sampler_suffix: Some("_sampler".to_string()),
        })
        .unwrap(),
    )
}

fn make_buffer(name: &str, usage: Usage) -> Arc<Buffer> {
    Buffer::new(
        BufferDesc {
            name: name.to_string(),
            size: 256,
            usage,
            bind_flags: BindFlags::UNIFORM_BUFFER,
        },
        ResourceState::CONSTANT_BUFFER,
    )
}

fn make_texture_view(name: &str) -> Arc<TextureView> {
    let texture = Texture::new(
        TextureDesc {
            name: name.to_string(),
            width: 128,
            height: 128,
            array_size: 1,
            mip_levels: 1,
            bind_flags: BindFlags::SHADER_RESOURCE,
        },
        ResourceState::SHADER_RESOURCE,
    );
    let view = TextureView::new(texture, TextureViewType::ShaderResource).unwrap();
    view.set_sampler(Some(Sampler::new(format!("{} sampler", name), SamplerDesc::default())));
    view
}

/// Shader with "Globals" (static) and the "Tex"/"Tex_sampler" pair (mutable)
fn scenario_shader(reversed: bool, extra: bool) -> Arc<Shader> {
    let mut resources = vec![
        res("Globals", ShaderResourceKind::ConstantBuffer, 0, 1),
        res("Tex", ShaderResourceKind::TextureSrv, 0, 1),
        res("Tex_sampler", ShaderResourceKind::Sampler, 0, 1),
    ];
    if extra {
        resources.push(res("Shadow", ShaderResourceKind::TextureSrv, 1, 1));
    }
    if reversed {
        resources.reverse();
    }
    make_shader("ScenePS", ShaderStage::Pixel, resources)
}

fn scenario_pipeline(device: &Arc<D3D12Device>, name: &str, shader: Arc<Shader>) -> Arc<D3D12PipelineState> {
    device
        .create_pipeline_state(D3D12PipelineStateDesc {
            name: name.to_string(),
            shaders: vec![shader],
            resource_layout: PipelineResourceLayoutDesc {
                default_variable_type: VariableType::Mutable,
                variables: vec![
                    ShaderVariableDesc::new("Globals", ShaderStageFlags::PIXEL, VariableType::Static),
                    ShaderVariableDesc::new("Frame", ShaderStageFlags::PIXEL, VariableType::Dynamic),
                ],
                immutable_samplers: Vec::new(),
            },
            strict_resource_layout: false,
        })
        .unwrap()
}

fn committed_root_views(commands: &[D3D12Command]) -> Vec<GpuVirtualAddress> {
    commands
        .iter()
        .filter_map(|c| match c {
            D3D12Command::SetRootConstantBufferView { address, .. } => Some(*address),
            _ => None,
        })
        .collect()
}

// ============================================================================
// LAYOUT TESTS
// ============================================================================

#[test]
fn test_integration_layout_counts() {
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let pso = scenario_pipeline(&device, "scene", scenario_shader(false, false));
    let layout = pso.resource_layout(ShaderStage::Pixel).unwrap();

    assert_eq!(layout.cbv_srv_uav_count(VariableType::Static), 1);
    assert_eq!(layout.cbv_srv_uav_count(VariableType::Mutable), 1);
    assert_eq!(layout.cbv_srv_uav_count(VariableType::Dynamic), 0);
    assert_eq!(layout.sampler_count(VariableType::Mutable), 1);

    let tex = layout.cbv_srv_uav(VariableType::Mutable, 0);
    assert_eq!(tex.name(), "Tex");
    let sampler = layout.assigned_sampler(tex).unwrap();
    assert_eq!(sampler.name(), "Tex_sampler");
    assert_eq!(sampler.name(), layout.sampler(VariableType::Mutable, 0).name());
}

#[test]
fn test_integration_layout_packing_by_type() {
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let shader = make_shader("PackPS", ShaderStage::Pixel, vec![
        res("Globals", ShaderResourceKind::ConstantBuffer, 0, 1),
        res("Frame", ShaderResourceKind::ConstantBuffer, 1, 1),
        res("Lights", ShaderResourceKind::BufferSrv, 0, 4),
        res("Tex", ShaderResourceKind::TextureSrv, 4, 1),
        res("Tex_sampler", ShaderResourceKind::Sampler, 0, 1),
        res("Output", ShaderResourceKind::TextureUav, 0, 1),
    ]);
    let pso = scenario_pipeline(&device, "pack", shader);
    let layout = pso.resource_layout(ShaderStage::Pixel).unwrap();

    let mut names = Vec::new();
    for var_type in VariableType::ALL {
        for r in 0..layout.cbv_srv_uav_count(var_type) {
            let resource = layout.cbv_srv_uav(var_type, r);
            assert_eq!(resource.var_type(), var_type);
            names.push(resource.name().to_string());
        }
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), layout.total_cbv_srv_uav_count());
    assert_eq!(names.len(), 5);
    assert_eq!(layout.total_sampler_count(), 1);
}

// ============================================================================
// COMPATIBILITY TESTS
// ============================================================================

#[test]
fn test_integration_pipeline_compatibility() {
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let a = scenario_pipeline(&device, "a", scenario_shader(false, false));
    let b = scenario_pipeline(&device, "b", scenario_shader(true, false));
    let c = scenario_pipeline(&device, "c", scenario_shader(false, true));

    assert_eq!(a.binding_hash(), b.binding_hash());
    assert!(a.root_signature().is_same_as(b.root_signature()));
    assert!(a.is_compatible_with(&b));

    assert!(!a.root_signature().is_same_as(c.root_signature()));
    assert!(!a.is_compatible_with(&c));

    // A binding from one pipeline commits with the other
    let srb = b.create_shader_resource_binding(true).unwrap();
    let mut ctx = device.create_device_context();
    ctx.set_pipeline_state(&a);
    assert!(ctx.commit_shader_resources(&srb, ResourceStateTransitionMode::None).is_ok());
    ctx.set_pipeline_state(&c);
    assert!(ctx.commit_shader_resources(&srb, ResourceStateTransitionMode::None).is_err());
}

// ============================================================================
// STATIC RESOURCE TESTS
// ============================================================================

#[test]
fn test_integration_static_round_trip() {
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let shader = make_shader("StaticPS", ShaderStage::Pixel, vec![
        res("Globals", ShaderResourceKind::ConstantBuffer, 0, 1),
        res("Material", ShaderResourceKind::ConstantBuffer, 1, 1),
        res("Albedo", ShaderResourceKind::TextureSrv, 0, 1),
        res("Albedo_sampler", ShaderResourceKind::Sampler, 0, 1),
    ]);
    let pso = device
        .create_pipeline_state(D3D12PipelineStateDesc {
            name: "static".to_string(),
            shaders: vec![shader],
            resource_layout: PipelineResourceLayoutDesc::default(),
            strict_resource_layout: false,
        })
        .unwrap();
    assert_eq!(pso.static_variable_count(ShaderStage::Pixel), 3);

    let set = |name: &str, object: DeviceObject| {
        pso.static_variable_by_name(ShaderStage::Pixel, name).unwrap().set(Some(object));
    };
    set("Globals", DeviceObject::Buffer(make_buffer("globals", Usage::Default)));
    set("Material", DeviceObject::Buffer(make_buffer("material", Usage::Default)));
    set("Albedo", DeviceObject::TextureView(make_texture_view("albedo")));

    let srb = D3D12ShaderResourceBinding::new(Arc::clone(&pso)).unwrap();
    srb.initialize_static_resources(&pso).unwrap();

    let layout = pso.resource_layout(ShaderStage::Pixel).unwrap();
    let cache = srb.lock_cache();
    for name in ["Globals", "Material", "Albedo", "Albedo_sampler"] {
        assert!(layout.is_bound(layout.find(name).unwrap(), 0, &cache), "{} is not bound", name);
    }
    assert!(layout.find("Normal").is_none());
}

#[test]
#[serial]
fn test_integration_static_initialization_is_idempotent() {
    let entries = TestLogger::install();
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let pso = scenario_pipeline(&device, "scene", scenario_shader(false, false));
    pso.static_variable_by_name(ShaderStage::Pixel, "Globals")
        .unwrap()
        .set(Some(DeviceObject::Buffer(make_buffer("globals", Usage::Default))));

    let srb = pso.create_shader_resource_binding(true).unwrap();
    let snapshot = |srb: &D3D12ShaderResourceBinding| {
        let cache = srb.lock_cache();
        (0..cache.num_root_tables())
            .flat_map(|root| cache.root_table(root).resources().to_vec())
            .map(|slot| slot.object)
            .collect::<Vec<_>>()
    };
    let once = snapshot(&srb);

    srb.initialize_static_resources(&pso).unwrap();

    assert_eq!(snapshot(&srb), once);
    assert!(logged(&entries, LogSeverity::Warn, "Static resources have already been initialized"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_bindings_keep_their_static_copy() {
    let _entries = TestLogger::install();
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let pso = scenario_pipeline(&device, "scene", scenario_shader(false, false));
    let buffer_a = make_buffer("A", Usage::Default);
    let buffer_b = make_buffer("B", Usage::Default);
    let globals = pso.static_variable_by_name(ShaderStage::Pixel, "Globals").unwrap();
    globals.set(Some(DeviceObject::Buffer(Arc::clone(&buffer_a))));

    let srb1 = pso.create_shader_resource_binding(true).unwrap();
    let srb2 = pso.create_shader_resource_binding(true).unwrap();

    // Static variables only take a new buffer after being reset
    globals.set(None);
    globals.set(Some(DeviceObject::Buffer(Arc::clone(&buffer_b))));
    let srb3 = pso.create_shader_resource_binding(true).unwrap();

    let mut ctx = device.create_device_context();
    ctx.set_pipeline_state(&pso);
    for (srb, expected) in [(&srb1, &buffer_a), (&srb2, &buffer_a), (&srb3, &buffer_b)] {
        ctx.take_commands();
        ctx.commit_shader_resources(srb, ResourceStateTransitionMode::None).unwrap();
        assert_eq!(committed_root_views(ctx.commands()), vec![GpuVirtualAddress::for_buffer(expected)]);
    }
    Engine::reset_logger();
}

// ============================================================================
// REBINDING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_rebinding_rules() {
    let entries = TestLogger::install();
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let shader = make_shader("RebindPS", ShaderStage::Pixel, vec![
        res("Frame", ShaderResourceKind::ConstantBuffer, 0, 1),
        res("Tex", ShaderResourceKind::TextureSrv, 0, 1),
        res("Tex_sampler", ShaderResourceKind::Sampler, 0, 1),
    ]);
    let pso = scenario_pipeline(&device, "rebind", shader);
    let srb = pso.create_shader_resource_binding(true).unwrap();

    // Dynamic constant buffer: the latest buffer wins
    let frame = srb.variable_by_name(ShaderStage::Pixel, "Frame").unwrap();
    assert_eq!(frame.variable_type(), VariableType::Dynamic);
    let first = make_buffer("first", Usage::Dynamic);
    let second = make_buffer("second", Usage::Dynamic);
    frame.set(Some(DeviceObject::Buffer(Arc::clone(&first))));
    frame.set(Some(DeviceObject::Buffer(Arc::clone(&second))));

    // Mutable texture: the first view stays
    let tex = srb.variable_by_name(ShaderStage::Pixel, "Tex").unwrap();
    let original = make_texture_view("original");
    tex.set(Some(DeviceObject::TextureView(Arc::clone(&original))));
    tex.set(Some(DeviceObject::TextureView(make_texture_view("replacement"))));
    assert!(logged(&entries, LogSeverity::Error, "Tex"));

    let layout = pso.resource_layout(ShaderStage::Pixel).unwrap();
    {
        let cache = srb.lock_cache();
        let slot = layout.find("Tex").unwrap();
        let bound = &cache.resource(slot.root_index(), slot.offset_from_table_start()).object;
        assert_eq!(bound.as_ref(), Some(&DeviceObject::TextureView(original)));
    }

    let mut ctx = device.create_device_context();
    ctx.set_pipeline_state(&pso);
    ctx.commit_shader_resources(&srb, ResourceStateTransitionMode::None).unwrap();
    assert!(ctx.map_dynamic_buffer(&first).is_ok());
    let address = ctx.map_dynamic_buffer(&second).unwrap();
    ctx.take_commands();
    ctx.draw(3, 0).unwrap();
    assert_eq!(committed_root_views(ctx.commands()), vec![address]);
    Engine::reset_logger();
}

#[test]
fn test_integration_placement_matches_across_bindings() {
    let device = D3D12Device::new(D3D12DeviceConfig::default());
    let pso = scenario_pipeline(&device, "scene", scenario_shader(false, false));
    let srb_a = pso.create_shader_resource_binding(false).unwrap();
    let srb_b = pso.create_shader_resource_binding(false).unwrap();
    let view = DeviceObject::TextureView(make_texture_view("shared"));

    for srb in [&srb_a, &srb_b] {
        srb.variable_by_name(ShaderStage::Pixel, "Tex").unwrap().set(Some(view.clone()));
    }

    let layout = pso.resource_layout(ShaderStage::Pixel).unwrap();
    let slot = layout.find("Tex").unwrap();
    for srb in [&srb_a, &srb_b] {
        let cache = srb.lock_cache();
        assert_eq!(cache.resource(slot.root_index(), slot.offset_from_table_start()).object.as_ref(), Some(&view));
    }
}
