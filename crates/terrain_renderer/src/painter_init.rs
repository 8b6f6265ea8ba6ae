//! Painter initialization and pipeline construction.
//!
//! This module owns `TerrainPainter::new` and the helpers that allocate
//! the shared bind group layout, samplers, and the render pipelines for
//! the tile color, composite, and coordinate-encoding passes.

use terrain_protocol::TerrainOptions;
use terrain_tiles::{COLOR_TARGET_FORMAT, DEPTH_FORMAT, RenderTargetPool, TerrainMesh, TileResourceStore};

use crate::{COORDS_TARGET_FORMAT, PainterCreateError, PipelineState, TerrainPainter, TerrainUniforms};

impl TerrainPainter {
    /// Builds the painter for a given screen surface format. The shared
    /// mesh resolution is fixed here for the painter's lifetime.
    pub fn new(
        device: wgpu::Device,
        screen_format: wgpu::TextureFormat,
        options: TerrainOptions,
    ) -> Result<Self, PainterCreateError> {
        let mesh = TerrainMesh::new(&device, options.mesh_size)?;

        let tile_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("terrain.tile_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<TerrainUniforms>() as u64,
                            ),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 4,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler_linear = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("terrain.sampler.linear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let sampler_nearest = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("terrain.sampler.nearest"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain.pipeline_layout"),
            bind_group_layouts: &[&tile_bind_group_layout],
            immediate_size: 0,
        });

        // Tile color and composite share one draw shader; the pipelines
        // differ only in target format and blend state.
        let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain.draw.shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("terrain_draw.wgsl").into()),
        });
        let coords_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain.coords.shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("terrain_coords.wgsl").into()),
        });

        let tile_color = create_terrain_pipeline(
            &device,
            &pipeline_layout,
            &draw_shader,
            COLOR_TARGET_FORMAT,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            "terrain.pipeline.tile_color",
        );
        let composite_alpha = create_terrain_pipeline(
            &device,
            &pipeline_layout,
            &draw_shader,
            screen_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            "terrain.pipeline.composite.alpha",
        );
        let composite_multiply = create_terrain_pipeline(
            &device,
            &pipeline_layout,
            &draw_shader,
            screen_format,
            Some(multiply_blend_state()),
            "terrain.pipeline.composite.multiply",
        );
        let composite_unblended = create_terrain_pipeline(
            &device,
            &pipeline_layout,
            &draw_shader,
            screen_format,
            None,
            "terrain.pipeline.composite.unblended",
        );
        let coords = create_terrain_pipeline(
            &device,
            &pipeline_layout,
            &coords_shader,
            COORDS_TARGET_FORMAT,
            None,
            "terrain.pipeline.coords",
        );

        Ok(Self {
            device,
            pipelines: PipelineState {
                tile_bind_group_layout,
                tile_color,
                composite_alpha,
                composite_multiply,
                composite_unblended,
                coords,
            },
            sampler_linear,
            sampler_nearest,
            pool: RenderTargetPool::new(),
            store: TileResourceStore::new(),
            mesh,
            frame: 0,
            coords: None,
            coords_revision: 0,
            latest_coords_revision: None,
        })
    }
}

pub(crate) fn multiply_blend_state() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Dst,
            dst_factor: wgpu::BlendFactor::Zero,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// All terrain pipelines share one vertex layout (grid position + per-tile
/// elevation), depth `LEqual` with writes, and back-face culling with
/// clockwise front faces in screen space.
fn create_terrain_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    label: &'static str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[TerrainMesh::vertex_layout(), TerrainMesh::elevation_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
