use blade_graphics as gpu;
use std::ptr;

use crate::scene::{Canvas as _, Framebuffer};

/// Presents a software framebuffer: the pixels go through a staging
/// buffer and get copied straight into the swapchain image.
pub struct Render {
    context: gpu::Context,
    surface: gpu::Surface,
    command_encoder: gpu::CommandEncoder,
    last_sync_point: Option<gpu::SyncPoint>,
    stage_buffer: gpu::Buffer,
    stage_size: u64,
    extent: gpu::Extent,
}

fn surface_config(extent: gpu::Extent) -> gpu::SurfaceConfig {
    gpu::SurfaceConfig {
        size: extent,
        usage: gpu::TextureUsage::TARGET | gpu::TextureUsage::COPY,
        display_sync: gpu::DisplaySync::Recent,
        ..Default::default()
    }
}

impl Render {
    pub fn new(window: &winit::window::Window) -> Self {
        let context = unsafe {
            gpu::Context::init(gpu::ContextDesc {
                presentation: true,
                validation: cfg!(debug_assertions),
                ..Default::default()
            })
        }
        .expect("Unable to initialize GPU");

        let window_size = window.inner_size();
        let extent = gpu::Extent {
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            depth: 1,
        };
        let surface = context
            .create_surface_configured(window, surface_config(extent))
            .expect("Unable to create the window surface");
        let command_encoder = context.create_command_encoder(gpu::CommandEncoderDesc {
            name: "main",
            buffer_count: 2,
        });

        let stage_size = (extent.width * extent.height * 4) as u64;
        let stage_buffer = context.create_buffer(gpu::BufferDesc {
            name: "stage frame",
            size: stage_size,
            memory: gpu::Memory::Upload,
        });

        Self {
            context,
            surface,
            command_encoder,
            last_sync_point: None,
            stage_buffer,
            stage_size,
            extent,
        }
    }

    pub fn extent(&self) -> gpu::Extent {
        self.extent
    }

    /// Whether the swapchain wants pixels blue first.
    pub fn is_bgra(&self) -> bool {
        matches!(
            self.surface.info().format,
            gpu::TextureFormat::Bgra8Unorm | gpu::TextureFormat::Bgra8UnormSrgb
        )
    }

    pub fn wait_for_gpu(&mut self) {
        if let Some(sync_point) = self.last_sync_point.take() {
            self.context.wait_for(&sync_point, !0);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.wait_for_gpu();
        self.extent = gpu::Extent {
            width: width.max(1),
            height: height.max(1),
            depth: 1,
        };
        self.context
            .reconfigure_surface(&mut self.surface, surface_config(self.extent));

        let size = (self.extent.width * self.extent.height * 4) as u64;
        if size > self.stage_size {
            self.context.destroy_buffer(self.stage_buffer);
            self.stage_buffer = self.context.create_buffer(gpu::BufferDesc {
                name: "stage frame",
                size,
                memory: gpu::Memory::Upload,
            });
            self.stage_size = size;
        }
    }

    pub fn present(&mut self, framebuffer: &Framebuffer) {
        profiling::scope!("present");
        let [width, height] = framebuffer.size();
        if width != self.extent.width || height != self.extent.height {
            log::warn!(
                "Skipping a {}x{} frame for a {}x{} surface",
                width,
                height,
                self.extent.width,
                self.extent.height
            );
            return;
        }

        // the previous copy must finish before the staging memory is reused
        self.wait_for_gpu();
        let bytes = framebuffer.as_bytes();
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.stage_buffer.data(), bytes.len());
        }

        let frame = self.surface.acquire_frame();
        self.command_encoder.start();
        self.command_encoder.init_texture(frame.texture());
        if let mut pass = self.command_encoder.transfer("upload frame") {
            pass.copy_buffer_to_texture(
                self.stage_buffer.into(),
                width * 4,
                frame.texture().into(),
                self.extent,
            );
        }
        self.command_encoder.present(frame);
        self.last_sync_point = Some(self.context.submit(&mut self.command_encoder));
    }
}

impl Drop for Render {
    fn drop(&mut self) {
        self.wait_for_gpu();
        self.context.destroy_buffer(self.stage_buffer);
        self.context
            .destroy_command_encoder(&mut self.command_encoder);
        self.context.destroy_surface(&mut self.surface);
    }
}
